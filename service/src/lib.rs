//! Process-level infrastructure shared by every layer: configuration and logging.

pub mod config;
pub mod logging;
