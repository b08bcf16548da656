use crate::adb::AdbError;
use crate::template_matching::MatchError;
use thiserror::Error;

pub type AutomationResult<T> = Result<T, AutomationError>;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Device error: {0}")]
    Device(#[from] AdbError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("App '{package}' did not reach the foreground after {attempts} attempts")]
    AppNotForeground { package: String, attempts: u32 },
}

impl AutomationError {
    /// True when retrying with the next frame cannot help
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AutomationError::Match(e) if e.is_invalid_input())
    }
}
