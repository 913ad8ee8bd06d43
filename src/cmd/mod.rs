//! CLI command implementations.
//!
//! | Module     | Commands handled |
//! |------------|------------------|
//! | `simulate` | `Simulate`       |
//! | `graph`    | `Graph`          |
//! | `config`   | `Config`         |

pub mod config;
pub mod graph;
pub mod simulate;

pub use config::cmd_config;
pub use graph::cmd_graph;
pub use simulate::{SimulateOptions, cmd_simulate};
