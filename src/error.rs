use crate::adb::AdbError;
use thiserror::Error;

pub type BotResult<T> = Result<T, BotError>;

/// Errors that end the bot loop.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Device transport failed: {0}")]
    Transport(#[from] AdbError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing template images: {}", .0.join(", "))]
    MissingTemplates(Vec<String>),

    #[error("The game client ({package}) is not installed on the device")]
    AppNotInstalled { package: String },

    #[error("Game client version {installed} is older than the required {required}")]
    OutdatedClient { installed: String, required: String },
}

impl BotError {
    /// Transport failures are worth one reconnect, everything else is fatal.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BotError::Transport(e) if e.is_transport_failure())
    }
}
