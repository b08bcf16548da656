// ADB module - device collaborators for UI automation
// Capability traits consumed by the automation session, and a backend that
// drives a device through the `adb` command line tool.

pub mod error;
pub mod shell;
pub mod types;


// Re-export the main types for easy access
pub use error::{AdbError, AdbResult};
pub use shell::AdbShell;
pub use types::{AppControl, Device, FrameSource, ImageCapture, InputDispatcher};
