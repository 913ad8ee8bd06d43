pub mod actor;
pub mod caravan_config;
pub mod duty;
pub mod errors;
pub mod graph;
pub mod host;
pub mod orchestrator;
pub mod phase;
pub mod signals;
pub mod sim;
pub mod tracker;
pub mod viability;
