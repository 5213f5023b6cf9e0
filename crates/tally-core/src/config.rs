//! Economy configuration: the typed schema an [`Economy`] is built from.
//!
//! Configurations are usually written by hand or produced by a rule
//! generator, and stored as YAML or JSON. Keys are camelCase:
//!
//! ```yaml
//! items: [gold, energy]
//! itemsMax:
//!   umbrella: 3
//! initAmounts:
//!   energy: 500
//! conversions:
//!   - inputs:
//!       energy: { amount: 1 }
//!     outcomes:
//!       - freq: 1
//!         wins:
//!           gold: { amount: 100 }
//!       - freq: 20
//!         wins: {}
//!     period: 5s
//! ```
//!
//! Nothing here is validated. Validation happens in [`Economy::new`], which
//! is the only place a configuration turns into simulation state.
//!
//! [`Economy`]: crate::Economy
//! [`Economy::new`]: crate::Economy::new

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML (or JSON) content.
    #[error("failed to parse config: {source}")]
    Yaml {
        /// The underlying parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level economy configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomyConfig {
    /// Plain item names (no cap).
    #[serde(default)]
    pub items: Vec<String>,

    /// Item names with a hard cap. These are items too; they need not be
    /// repeated in [`items`](Self::items).
    #[serde(default)]
    pub items_max: BTreeMap<String, Decimal>,

    /// Every recipe, immediate and periodic, in declaration order.
    #[serde(default)]
    pub conversions: Vec<ConversionSpec>,

    /// Starting balances. Items not listed start at zero.
    #[serde(default)]
    pub init_amounts: BTreeMap<String, Decimal>,
}

impl EconomyConfig {
    /// Load a configuration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content does not match the schema.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a configuration from a YAML (or JSON) string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string does not match the schema.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(text)?)
    }

    /// Render the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }
}

/// One recipe. The presence of [`period`](Self::period) makes it periodic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSpec {
    /// Consumed items, keyed by item name.
    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,

    /// Weighted outcome table. Order defines the frequency ranges.
    #[serde(default)]
    pub outcomes: Vec<OutcomeSpec>,

    /// Human-readable recurrence such as `"5s"` or `"1h"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// How much of an item a conversion consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    /// Amount consumed per execution.
    pub amount: Decimal,

    /// Skip the affordability check; a shortfall empties the item instead.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

/// One weighted branch of a conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeSpec {
    /// Relative weight of this outcome.
    pub freq: u64,

    /// Payouts, keyed by item name.
    #[serde(default)]
    pub wins: BTreeMap<String, WinSpec>,
}

/// A single payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinSpec {
    /// Amount granted.
    pub amount: Decimal,

    /// Absolute ceiling on the item balance after this payout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_limit: Option<Decimal>,
}

impl InputSpec {
    /// An ordinary input that blocks execution when unaffordable.
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            force: false,
        }
    }

    /// An input that never blocks execution.
    pub const fn forced(amount: Decimal) -> Self {
        Self {
            amount,
            force: true,
        }
    }
}

impl WinSpec {
    /// A payout without a total limit.
    pub const fn new(amount: Decimal) -> Self {
        Self {
            amount,
            total_limit: None,
        }
    }

    /// A payout whose resulting balance is clamped to `total_limit`.
    pub const fn limited(amount: Decimal, total_limit: Decimal) -> Self {
        Self {
            amount,
            total_limit: Some(total_limit),
        }
    }
}
