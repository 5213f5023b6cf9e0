//! Error types for the `tally-core` crate.
//!
//! Two families of failure exist and they never mix:
//!
//! - [`VerificationError`] is raised only while an [`Economy`] is being
//!   constructed. The configuration is at fault; fix it and construct again.
//! - [`SimulationError`] is raised only while simulating. It signals a broken
//!   internal invariant or a conversion set that never settles, and is fatal
//!   for the run.
//!
//! [`Economy`]: crate::Economy

use rust_decimal::Decimal;

/// Errors detected while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// An input, win or initial amount names an item that was never declared.
    #[error("no such item {name}")]
    UnknownItem {
        /// The undeclared item name.
        name: String,
    },

    /// The duration parser rejected a conversion period.
    #[error("invalid conversion period {period:?}")]
    InvalidPeriod {
        /// The period text as written in the configuration.
        period: String,
    },

    /// The period parsed, but is shorter than one simulated second.
    #[error("conversion period {period:?} is shorter than one second")]
    ZeroPeriod {
        /// The period text as written in the configuration.
        period: String,
    },

    /// Every outcome of a conversion has zero frequency.
    #[error("conversion #{conversion} has zero total outcome frequency")]
    ZeroTotalFrequency {
        /// Position of the conversion in the configuration.
        conversion: usize,
    },

    /// Outcome frequencies of a conversion add up past `u64::MAX`.
    #[error("conversion #{conversion} total outcome frequency overflows")]
    FrequencyOverflow {
        /// Position of the conversion in the configuration.
        conversion: usize,
    },

    /// A quantity that must not be negative is negative.
    #[error("{field} for item {item} must not be negative, got {amount}")]
    NegativeAmount {
        /// Which configuration field carried the value.
        field: &'static str,
        /// The item the value belongs to.
        item: String,
        /// The offending value.
        amount: Decimal,
    },

    /// An immediate conversion has no blocking input, so it could fire
    /// forever within a single instant.
    #[error("immediate conversion #{conversion} has no unforced input and never settles")]
    UnboundedConversion {
        /// Position of the conversion in the configuration.
        conversion: usize,
    },
}

/// Fatal errors raised while a simulation is running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    /// The outcome draw fell outside every outcome range.
    #[error("BUG: no outcome covers draw {draw} of total frequency {total}")]
    NoOutcome {
        /// The drawn value.
        draw: u64,
        /// The conversion's total frequency.
        total: u64,
    },

    /// Immediate conversions kept firing past the drain pass limit.
    #[error("immediate conversions did not settle after {passes} passes at time {time}")]
    DrainDiverged {
        /// Simulated time at which draining was abandoned.
        time: u64,
        /// Number of full passes performed.
        passes: u64,
    },
}
