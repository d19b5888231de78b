pub mod db;
pub mod error;
pub mod export;
pub mod macros;
pub mod models;
pub mod service;

pub use error::{Error, Result};
pub use macros::{Goal, MacroResult, MacroSettings, compute_macros};
pub use service::TrackerService;
