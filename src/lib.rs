pub mod adb;
pub mod catalog;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod logging;
pub mod preflight;
pub mod vision;

pub use error::{BotError, BotResult};
