//! Period parsing for periodic conversions.
//!
//! The economy only needs one thing from a duration parser: turn text such as
//! `"5s"`, `"1h"` or `"2h 30m"` into milliseconds, or report that it cannot.
//! [`DurationParser`] is that seam; [`HumanDuration`] is the default
//! implementation, backed by `humantime`.

/// Turns a human-readable period into milliseconds.
pub trait DurationParser {
    /// Parse `text`, returning `None` when it is not a valid duration.
    fn parse_millis(&self, text: &str) -> Option<u64>;
}

/// [`DurationParser`] backed by [`humantime::parse_duration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanDuration;

impl DurationParser for HumanDuration {
    fn parse_millis(&self, text: &str) -> Option<u64> {
        let duration = humantime::parse_duration(text.trim()).ok()?;
        u64::try_from(duration.as_millis()).ok()
    }
}

/// Convert a parsed period into whole simulated seconds, flooring.
pub const fn whole_seconds(millis: u64) -> u64 {
    millis / 1000
}
