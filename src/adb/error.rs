use thiserror::Error;

/// A specialized `Result` type for device operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all ADB-related operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error("Failed to connect to device {target}: {source}")]
    ConnectionFailed {
        target: String,
        source: adb_client::RustADBError,
    },

    #[error("Shell command '{command}' failed: {source}")]
    ShellCommandFailed {
        command: String,
        source: adb_client::RustADBError,
    },

    #[error("Operation timed out after {duration:?}: {description}")]
    Timeout {
        duration: std::time::Duration,
        description: String,
    },

    #[error("Shell command '{command}' still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        command: String,
        attempts: u32,
        last: String,
    },

    #[error("Task failed to complete: {source}")]
    JoinError {
        #[from]
        source: tokio::task::JoinError,
    },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Failed to decode screen capture: {description}")]
    ImageDecodeFailed { description: String },

    #[error("ADB protocol desync (CLSE error) - connection needs to be re-established: {description}")]
    ProtocolDesync { description: String },
}

impl AdbError {
    /// Errors after which the device link is unusable and the loop must reconnect
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            AdbError::ConnectionFailed { .. }
                | AdbError::Timeout { .. }
                | AdbError::RetriesExhausted { .. }
                | AdbError::JoinError { .. }
                | AdbError::ProtocolDesync { .. }
        )
    }

    /// Classify an adb_client failure, promoting protocol desync to its own variant
    pub fn from_shell_failure(command: String, source: adb_client::RustADBError) -> Self {
        let err_str = source.to_string();
        if err_str.contains("CLSE") || err_str.contains("no write endpoint") {
            AdbError::ProtocolDesync {
                description: format!("Command '{command}' failed with protocol error: {err_str}"),
            }
        } else {
            AdbError::ShellCommandFailed { command, source }
        }
    }
}
