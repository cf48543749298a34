pub mod analysis;
pub mod concurrency;
pub mod config;
pub mod determinism;
pub mod notify;
pub mod process;
pub mod session;
pub mod standards;

pub mod error;
