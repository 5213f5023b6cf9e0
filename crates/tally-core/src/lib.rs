//! Conversion economy simulator.
//!
//! A set of named, optionally capped resources ("items") evolves through
//! conversions: recipes that consume fixed amounts of some items and pay one
//! randomly selected, frequency-weighted outcome. Periodic conversions recur
//! on a fixed period of simulated seconds; immediate conversions fire as soon
//! as their inputs are affordable. Running an [`Economy`] to a horizon
//! forecasts resource levels for economy tuning.
//!
//! # Modules
//!
//! - [`config`] -- Typed configuration schema and YAML/JSON loading.
//! - [`duration`] -- [`DurationParser`] seam for human-readable periods.
//! - [`ledger`] -- The [`Ledger`]: every item balance, addressed by
//!   [`ItemId`].
//! - [`conversion`] -- [`Conversion`] recipes, outcome selection and payout
//!   clamps.
//! - [`schedule`] -- [`PeriodicConversion`]: a conversion plus a recurrence.
//! - [`economy`] -- The [`Economy`] driver loop.
//!
//! # Usage
//!
//! ```
//! use tally_core::{Economy, EconomyConfig};
//!
//! let yaml = r"
//! items: [energy, gold]
//! initAmounts:
//!   energy: 3
//! conversions:
//!   - inputs:
//!       energy: { amount: 1 }
//!     outcomes:
//!       - freq: 1
//!         wins:
//!           gold: { amount: 10 }
//!     period: 1s
//! ";
//! let config = EconomyConfig::parse(yaml).ok();
//! let mut economy = config.and_then(|c| Economy::seeded(&c, 1).ok());
//! if let Some(economy) = economy.as_mut() {
//!     let _ = economy.simulate(60);
//!     assert_eq!(economy.amount("gold").map(|g| g.to_string()), Some("30".to_owned()));
//! }
//! ```

pub mod config;
pub mod conversion;
pub mod duration;
pub mod economy;
pub mod error;
pub mod ledger;
pub mod schedule;

// Re-export primary types at crate root.
pub use config::{ConfigError, ConversionSpec, EconomyConfig, InputSpec, OutcomeSpec, WinSpec};
pub use conversion::{Conversion, ConversionInput, ConversionWin, Outcome};
pub use duration::{DurationParser, HumanDuration};
pub use economy::{DEFAULT_MAX_DRAIN_PASSES, Economy};
pub use error::{SimulationError, VerificationError};
pub use ledger::{Item, ItemId, Ledger, Snapshot};
pub use schedule::{PeriodicConversion, Schedule};
