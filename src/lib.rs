pub mod adb;
pub mod automation;
pub mod loader;
pub mod template_matching;

pub use automation::Session;
pub use template_matching::{Frame, Match, MatchConfig, MatchMode, Reference, TemplateMatcher};
