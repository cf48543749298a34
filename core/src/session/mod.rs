pub mod autosave;
pub mod snapshot;
pub mod state;
pub mod store;
