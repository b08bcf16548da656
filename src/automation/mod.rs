// Automation module
// Composes a device, the template matcher and a simple poll loop into the
// capture -> match -> tap workflow.

pub mod error;
pub mod session;

#[cfg(test)]
mod tests;

pub use error::{AutomationError, AutomationResult};
pub use session::{Session, SessionTimings, TapOutcome};
