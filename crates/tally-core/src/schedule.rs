//! Periodic conversions: a [`Conversion`] plus a recurrence.
//!
//! A periodic conversion fires whenever simulated time reaches its next
//! execution time, whether or not its inputs are affordable. Shortfalls are
//! absorbed by the spend floor (balances clamp at zero). The first firing is
//! one full period after time zero.

use rand::Rng;

use crate::conversion::Conversion;
use crate::duration::{self, DurationParser};
use crate::error::{SimulationError, VerificationError};
use crate::ledger::Ledger;

/// Recurrence state of a periodic conversion, in simulated seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    period: u64,
    next_exec_time: u64,
}

impl Schedule {
    /// A schedule first due at `period`.
    pub const fn new(period: u64) -> Self {
        Self {
            period,
            next_exec_time: period,
        }
    }

    /// Parse a human-readable period, flooring to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidPeriod`] if the parser rejects the
    /// text, or [`VerificationError::ZeroPeriod`] if it is under one second.
    pub fn parse(text: &str, parser: &dyn DurationParser) -> Result<Self, VerificationError> {
        let millis = parser
            .parse_millis(text)
            .ok_or_else(|| VerificationError::InvalidPeriod {
                period: text.to_owned(),
            })?;
        let period = duration::whole_seconds(millis);
        if period == 0 {
            return Err(VerificationError::ZeroPeriod {
                period: text.to_owned(),
            });
        }
        Ok(Self::new(period))
    }

    /// Recurrence in seconds.
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Simulated time of the next firing.
    pub const fn next_exec_time(&self) -> u64 {
        self.next_exec_time
    }

    /// Whether the schedule fires at exactly `time`.
    pub const fn is_due(&self, time: u64) -> bool {
        self.next_exec_time == time
    }

    const fn advance(&mut self) {
        self.next_exec_time = self.next_exec_time.saturating_add(self.period);
    }

    /// Rewind to the first firing.
    pub const fn reset(&mut self) {
        self.next_exec_time = self.period;
    }
}

/// A conversion that recurs on a fixed period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicConversion {
    conversion: Conversion,
    schedule: Schedule,
}

impl PeriodicConversion {
    /// Attach a schedule to a conversion.
    pub const fn new(conversion: Conversion, schedule: Schedule) -> Self {
        Self {
            conversion,
            schedule,
        }
    }

    /// The underlying recipe.
    pub const fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    /// Current recurrence state.
    pub const fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Simulated time of the next firing.
    pub const fn next_exec_time(&self) -> u64 {
        self.schedule.next_exec_time()
    }

    /// Whether the inputs are affordable right now. Only used for scheduling;
    /// firing itself is never gated.
    pub fn can_execute(&self, ledger: &Ledger) -> bool {
        self.conversion.can_execute(ledger)
    }

    /// Execute unconditionally and move the schedule one period ahead.
    ///
    /// # Errors
    ///
    /// Propagates [`SimulationError`] from the underlying conversion.
    pub fn execute<R: Rng>(
        &mut self,
        ledger: &mut Ledger,
        rng: &mut R,
    ) -> Result<usize, SimulationError> {
        let outcome = self.conversion.execute(ledger, rng)?;
        self.schedule.advance();
        Ok(outcome)
    }

    /// Rewind the schedule to the first firing.
    pub const fn reset(&mut self) {
        self.schedule.reset();
    }
}
