//! The simulation driver.
//!
//! An [`Economy`] owns the [`Ledger`], every immediate [`Conversion`], every
//! [`PeriodicConversion`] and the random source used for outcome draws. Each
//! call to [`Economy::simulate`] runs from simulated time zero to the horizon:
//!
//! 1. **Fire** every periodic conversion due at the current time,
//!    unconditionally.
//! 2. **Drain** immediate conversions to a fixed point: full passes over the
//!    list, executing each conversion that is affordable when visited, until
//!    a pass executes nothing. Cascades within one instant resolve here.
//! 3. **Jump** to the earliest next execution time among periodic
//!    conversions that are affordable right now, or to the horizon if there
//!    is none.
//!
//! The jump only decides how far to skip; it never stops a periodic
//! conversion from firing when the clock lands on it. A timer that is skipped
//! while unaffordable stays behind the clock and pulls it back once its inputs
//! become affordable again.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

use crate::config::EconomyConfig;
use crate::conversion::Conversion;
use crate::duration::{DurationParser, HumanDuration};
use crate::error::{SimulationError, VerificationError};
use crate::ledger::{Ledger, Snapshot};
use crate::schedule::{PeriodicConversion, Schedule};

/// Default limit on drain passes within one simulated instant: unlimited.
///
/// Draining a balance of `n` units through a conversion that consumes one
/// unit takes `n` passes, so any finite default would cut off legitimate
/// runs. Set a limit with [`Economy::with_max_drain_passes`] when the
/// configuration may contain self-feeding cycles.
pub const DEFAULT_MAX_DRAIN_PASSES: u64 = u64::MAX;

/// A complete, validated economy ready to simulate.
#[derive(Debug)]
pub struct Economy<R = StdRng> {
    ledger: Ledger,
    conversions: Vec<Conversion>,
    periodic: Vec<PeriodicConversion>,
    rng: R,
    time: u64,
    max_drain_passes: u64,
}

impl Economy<StdRng> {
    /// Validate a configuration and build an economy seeded from the OS.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] if the configuration is invalid.
    pub fn new(config: &EconomyConfig) -> Result<Self, VerificationError> {
        Self::with_rng(config, &HumanDuration, StdRng::from_os_rng())
    }

    /// Validate a configuration and build an economy with a reproducible
    /// random source.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] if the configuration is invalid.
    pub fn seeded(config: &EconomyConfig, seed: u64) -> Result<Self, VerificationError> {
        Self::with_rng(config, &HumanDuration, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Economy<R> {
    /// Validate a configuration with an explicit duration parser and random
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] for unknown items, unparsable or
    /// sub-second periods, zero total frequencies, negative amounts, or an
    /// immediate conversion that nothing can block.
    pub fn with_rng(
        config: &EconomyConfig,
        parser: &dyn DurationParser,
        rng: R,
    ) -> Result<Self, VerificationError> {
        let ledger = Ledger::initialize(config)?;
        let mut conversions = Vec::new();
        let mut periodic = Vec::new();

        for (position, spec) in config.conversions.iter().enumerate() {
            let conversion = Conversion::build(spec, position, &ledger)?;
            match spec.period.as_deref().filter(|period| !period.trim().is_empty()) {
                Some(period) => {
                    let schedule = Schedule::parse(period, parser)?;
                    periodic.push(PeriodicConversion::new(conversion, schedule));
                }
                None => {
                    if !conversion.has_blocking_input() {
                        return Err(VerificationError::UnboundedConversion {
                            conversion: position,
                        });
                    }
                    conversions.push(conversion);
                }
            }
        }

        debug!(
            items = ledger.len(),
            immediate = conversions.len(),
            periodic = periodic.len(),
            "Economy constructed"
        );

        Ok(Self {
            ledger,
            conversions,
            periodic,
            rng,
            time: 0,
            max_drain_passes: DEFAULT_MAX_DRAIN_PASSES,
        })
    }

    /// Override the drain pass limit (at least one pass is always allowed).
    #[must_use]
    pub fn with_max_drain_passes(mut self, passes: u64) -> Self {
        self.max_drain_passes = passes.max(1);
        self
    }

    /// Run from time zero until simulated time reaches `horizon`.
    ///
    /// At least one fire/drain step always runs, even for a zero horizon.
    /// Balances and timers carry over from previous calls; use
    /// [`reset`](Self::reset) between independent runs.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if an outcome draw breaks the frequency
    /// partition or immediate conversions never settle.
    pub fn simulate(&mut self, horizon: u64) -> Result<(), SimulationError> {
        info!(
            horizon,
            immediate = self.conversions.len(),
            periodic = self.periodic.len(),
            "Simulation started"
        );

        self.time = 0;
        loop {
            self.fire_due()?;
            self.drain()?;

            let next = self.next_time(horizon);
            debug!(from = self.time, to = next, "Clock advanced");
            self.time = next;
            if self.time >= horizon {
                break;
            }
        }

        info!(time = self.time, "Simulation finished");
        Ok(())
    }

    /// Fire every periodic conversion due now, affordable or not.
    fn fire_due(&mut self) -> Result<(), SimulationError> {
        let time = self.time;
        for (index, periodic) in self.periodic.iter_mut().enumerate() {
            if periodic.schedule().is_due(time) {
                let outcome = periodic.execute(&mut self.ledger, &mut self.rng)?;
                debug!(
                    time,
                    conversion = index,
                    outcome,
                    next = periodic.next_exec_time(),
                    "Periodic conversion fired"
                );
            }
        }
        Ok(())
    }

    /// Execute affordable immediate conversions until a pass executes none.
    fn drain(&mut self) -> Result<(), SimulationError> {
        let mut passes = 0_u64;
        loop {
            let mut executed = 0_usize;
            for (index, conversion) in self.conversions.iter().enumerate() {
                if conversion.can_execute(&self.ledger) {
                    let outcome = conversion.execute(&mut self.ledger, &mut self.rng)?;
                    trace!(time = self.time, conversion = index, outcome, "Conversion executed");
                    executed = executed.saturating_add(1);
                }
            }
            if executed == 0 {
                return Ok(());
            }

            passes = passes.saturating_add(1);
            if passes >= self.max_drain_passes {
                warn!(time = self.time, passes, "Immediate conversions did not settle");
                return Err(SimulationError::DrainDiverged {
                    time: self.time,
                    passes,
                });
            }
        }
    }

    /// Earliest next execution among affordable periodic conversions, capped
    /// at the horizon.
    fn next_time(&self, horizon: u64) -> u64 {
        self.periodic
            .iter()
            .filter(|periodic| periodic.can_execute(&self.ledger))
            .map(PeriodicConversion::next_exec_time)
            .fold(horizon, u64::min)
    }

    /// Restore starting balances and periodic timers.
    ///
    /// Caps are not re-applied to restored balances.
    pub fn reset(&mut self) {
        self.ledger.reset();
        for periodic in &mut self.periodic {
            periodic.reset();
        }
        self.time = 0;
    }

    /// Snapshot of every balance by item name.
    pub fn result(&self) -> Snapshot {
        self.ledger.snapshot()
    }

    /// Balance of a named item, if it exists.
    pub fn amount(&self, name: &str) -> Option<Decimal> {
        self.ledger.get(name).ok().map(crate::ledger::Item::amount)
    }

    /// Simulated time at which the last [`simulate`](Self::simulate) stopped.
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// The ledger.
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Immediate conversions in declaration order.
    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    /// Periodic conversions in declaration order.
    pub fn periodic(&self) -> &[PeriodicConversion] {
        &self.periodic
    }
}
