pub mod cache;
pub mod classifier;
pub mod finding;
pub mod heuristic;
pub mod orchestrator;
pub mod payload;
pub mod render;
pub mod response;
