use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for device operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all device-bridge operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error(
        "'adb' binary not found in PATH. Install Android Platform Tools (https://developer.android.com/tools/adb) or add 'adb' to PATH."
    )]
    AdbNotFound,

    #[error("Failed to run '{command}': {source}")]
    CommandSpawn {
        command: String,
        source: std::io::Error,
    },

    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("No devices found. Connect a device and authorize USB debugging.")]
    NoDevices,

    #[error("Device '{name}' not found")]
    DeviceNotFound { name: String },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Coordinates are out of bounds: x={x}, y={y} (screen {width}x{height})")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("Failed to read screenshot file {path:?}: {source}")]
    ScreenshotFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AdbError {
    pub(crate) fn command_failed(command: &str, stderr: &[u8]) -> Self {
        AdbError::CommandFailed {
            command: command.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
