pub mod planner;
pub mod processor;
pub mod retry;
pub mod stats;
pub mod upsert;
