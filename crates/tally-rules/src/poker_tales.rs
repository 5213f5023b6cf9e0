//! "Poker tales" rules: a poker table, a theft chain and a multi-level story.
//!
//! The generated economy has these parts:
//!
//! - **Energy refill**: a periodic, input-free conversion that tops energy up
//!   to `refillEnergyAmount` (a total limit, not an increment cap).
//! - **Poker**: a periodic conversion spending energy. Every poker outcome
//!   pays its prizes plus a theft ticket `theft{i}` (capped at one held).
//! - **Theft**: for each non-zero probability `probs[i]`, an immediate
//!   conversion turns `theft{i}` into a `theftPass` with `probs[i]`% chance.
//!   Each pass is then played for the win or lose prize.
//! - **Story**: `levelsNum` levels of `first.len()` sub-levels. Sub-level `k`
//!   of level `L` costs `floor(first[k].goldInput * multi[k].goldInput^L)`
//!   gold plus the `level{n}` marker, and pays scaled wins plus the marker
//!   `level{n+1}`. The player starts holding `level0`.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::{ConversionSpec, EconomyConfig, InputSpec, OutcomeSpec, WinSpec};
use tracing::debug;

use crate::error::RulesError;

/// Energy item.
pub const ENERGY: &str = "energy";
/// Gold item.
pub const GOLD: &str = "gold";
/// Anchor item.
pub const ANCHOR: &str = "anchor";
/// Magic ball item.
pub const MAGICBALL: &str = "magicball";
/// Crown item.
pub const CROWN: &str = "crown";
/// Pass granted by a successful theft roll.
pub const THEFT_PASS: &str = "theftPass";
/// Egg item.
pub const EGG: &str = "egg";
/// Umbrella item.
pub const UMBRELLA: &str = "umbrella";

/// Most umbrellas a player can hold.
const UMBRELLA_MAX: u32 = 3;

/// Percent scale of theft probabilities.
const PERCENT: u64 = 100;

/// Theft ticket handed out by poker outcome `index`.
pub fn theft_item(index: usize) -> String {
    format!("theft{index}")
}

/// Story progress marker `index`.
pub fn level_item(index: u64) -> String {
    format!("level{index}")
}

/// Top-level game-design parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerTalesRules {
    /// Starting energy.
    pub init_energy: Decimal,

    /// How often energy is refilled, e.g. `"1h"`.
    pub refill_energy_period: String,

    /// Energy level a refill tops up to.
    #[serde(default = "default_refill_energy_amount")]
    pub refill_energy_amount: Decimal,

    /// Poker table parameters.
    pub poker: PokerRules,

    /// Theft chain parameters.
    pub theft: TheftRules,

    /// Story parameters.
    pub story: StoryRules,
}

/// Poker table parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerRules {
    /// Energy spent per hand.
    pub energy_input: Decimal,

    /// How often a hand is played.
    pub period: String,

    /// Weighted hand results.
    pub outcomes: Vec<PokerOutcome>,
}

/// One weighted poker result. Missing prizes pay zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerOutcome {
    /// Relative weight.
    pub freq: u64,
    /// Gold prize.
    #[serde(default)]
    pub gold: Option<Decimal>,
    /// Anchor prize.
    #[serde(default)]
    pub anchor: Option<Decimal>,
    /// Magic ball prize.
    #[serde(default)]
    pub magicball: Option<Decimal>,
    /// Crown prize.
    #[serde(default)]
    pub crown: Option<Decimal>,
}

/// Theft chain parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheftRules {
    /// Percent chance that ticket `theft{i}` becomes a pass.
    pub probs: Vec<u64>,

    /// Prize for a won theft.
    pub win: TheftOutcome,

    /// Prize for a lost theft.
    #[serde(alias = "loose")]
    pub lose: TheftOutcome,
}

/// A weighted theft result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheftOutcome {
    /// Relative weight.
    pub freq: u64,
    /// Gold paid.
    pub gold: Decimal,
    /// Energy paid.
    pub energy: Decimal,
}

/// Story parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRules {
    /// Sub-levels of the first level.
    pub first: Vec<StorySubLevel>,

    /// Per-level growth factors, one entry per sub-level of `first`.
    pub multi: Vec<StorySubLevel>,

    /// Number of levels.
    pub levels_num: u32,
}

/// Cost and rewards of one story sub-level (or their growth factors).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySubLevel {
    /// Gold consumed.
    pub gold_input: Decimal,

    /// Items paid, keyed by item name.
    #[serde(default)]
    pub wins: BTreeMap<String, Decimal>,
}

impl PokerTalesRules {
    /// Load rules from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Io`] or [`RulesError::Yaml`].
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse rules from a YAML (or JSON) string.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::Yaml`] if the text does not match the schema.
    pub fn parse(text: &str) -> Result<Self, RulesError> {
        Ok(serde_yml::from_str(text)?)
    }

    /// Build the full economy configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError`] if the theft or story parameters are
    /// inconsistent.
    pub fn generate(&self) -> Result<EconomyConfig, RulesError> {
        let mut config = EconomyConfig {
            items: [ENERGY, GOLD, ANCHOR, MAGICBALL, CROWN, THEFT_PASS, EGG, UMBRELLA]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            ..EconomyConfig::default()
        };
        config
            .items_max
            .insert(UMBRELLA.to_owned(), Decimal::from(UMBRELLA_MAX));
        config
            .init_amounts
            .insert(ENERGY.to_owned(), self.init_energy);

        config.conversions.push(self.refill());
        self.poker.generate(&mut config);
        self.theft.generate(self.poker.outcomes.len(), &mut config)?;
        self.story.generate(&mut config)?;

        debug!(
            items = config.items.len(),
            capped = config.items_max.len(),
            conversions = config.conversions.len(),
            "Poker tales configuration generated"
        );
        Ok(config)
    }

    fn refill(&self) -> ConversionSpec {
        let amount = self.refill_energy_amount;
        ConversionSpec {
            inputs: BTreeMap::new(),
            outcomes: vec![OutcomeSpec {
                freq: 1,
                wins: BTreeMap::from([(ENERGY.to_owned(), WinSpec::limited(amount, amount))]),
            }],
            period: Some(self.refill_energy_period.clone()),
        }
    }
}

impl PokerRules {
    fn generate(&self, config: &mut EconomyConfig) {
        let mut spec = ConversionSpec {
            inputs: BTreeMap::from([(ENERGY.to_owned(), InputSpec::new(self.energy_input))]),
            outcomes: Vec::with_capacity(self.outcomes.len()),
            period: Some(self.period.clone()),
        };

        for (index, outcome) in self.outcomes.iter().enumerate() {
            let theft = theft_item(index);
            config.items_max.insert(theft.clone(), Decimal::ONE);

            let prize = |amount: Option<Decimal>| WinSpec::new(amount.unwrap_or(Decimal::ZERO));
            spec.outcomes.push(OutcomeSpec {
                freq: outcome.freq,
                wins: BTreeMap::from([
                    (GOLD.to_owned(), prize(outcome.gold)),
                    (ANCHOR.to_owned(), prize(outcome.anchor)),
                    (MAGICBALL.to_owned(), prize(outcome.magicball)),
                    (CROWN.to_owned(), prize(outcome.crown)),
                    (theft, WinSpec::new(Decimal::ONE)),
                ]),
            });
        }

        config.conversions.push(spec);
    }
}

impl TheftRules {
    fn generate(&self, poker_outcomes: usize, config: &mut EconomyConfig) -> Result<(), RulesError> {
        for (index, &prob) in self.probs.iter().enumerate() {
            if prob == 0 {
                continue;
            }
            if prob > PERCENT {
                return Err(RulesError::ProbabilityOutOfRange { index, prob });
            }
            if index >= poker_outcomes {
                return Err(RulesError::TheftWithoutPokerOutcome { index });
            }

            config.conversions.push(ConversionSpec {
                inputs: BTreeMap::from([(theft_item(index), InputSpec::new(Decimal::ONE))]),
                outcomes: vec![
                    OutcomeSpec {
                        freq: prob,
                        wins: BTreeMap::from([(THEFT_PASS.to_owned(), WinSpec::new(Decimal::ONE))]),
                    },
                    OutcomeSpec {
                        freq: PERCENT.saturating_sub(prob),
                        wins: BTreeMap::new(),
                    },
                ],
                period: None,
            });
        }

        config.conversions.push(ConversionSpec {
            inputs: BTreeMap::from([(THEFT_PASS.to_owned(), InputSpec::new(Decimal::ONE))]),
            outcomes: vec![self.win.outcome(), self.lose.outcome()],
            period: None,
        });
        Ok(())
    }
}

impl TheftOutcome {
    fn outcome(&self) -> OutcomeSpec {
        OutcomeSpec {
            freq: self.freq,
            wins: BTreeMap::from([
                (GOLD.to_owned(), WinSpec::new(self.gold)),
                (ENERGY.to_owned(), WinSpec::new(self.energy)),
            ]),
        }
    }
}

impl StoryRules {
    fn generate(&self, config: &mut EconomyConfig) -> Result<(), RulesError> {
        let overflow = |level: u32| RulesError::Overflow { level };
        let per_level = u64::try_from(self.first.len())
            .ok()
            .ok_or_else(|| overflow(0))?;
        let last_marker = u64::from(self.levels_num)
            .checked_mul(per_level)
            .ok_or_else(|| overflow(self.levels_num))?;

        for marker in 0..=last_marker {
            config.items.push(level_item(marker));
        }
        config.init_amounts.insert(level_item(0), Decimal::ONE);

        for level in 0..self.levels_num {
            let mut marker = u64::from(level)
                .checked_mul(per_level)
                .ok_or_else(|| overflow(level))?;

            for (sub_level, first) in self.first.iter().enumerate() {
                let multi = self
                    .multi
                    .get(sub_level)
                    .ok_or(RulesError::MissingMultiplier { sub_level })?;
                let next = marker.checked_add(1).ok_or_else(|| overflow(level))?;

                let mut wins = BTreeMap::new();
                for (item, amount) in &first.wins {
                    let factor = multi.wins.get(item).ok_or_else(|| {
                        RulesError::MissingWinMultiplier {
                            sub_level,
                            item: item.clone(),
                        }
                    })?;
                    wins.insert(item.clone(), WinSpec::new(scale(*amount, *factor, level)?));
                }
                wins.insert(level_item(next), WinSpec::new(Decimal::ONE));

                let gold_input = scale(first.gold_input, multi.gold_input, level)?;
                config.conversions.push(ConversionSpec {
                    inputs: BTreeMap::from([
                        (GOLD.to_owned(), InputSpec::new(gold_input)),
                        (level_item(marker), InputSpec::new(Decimal::ONE)),
                    ]),
                    outcomes: vec![OutcomeSpec { freq: 1, wins }],
                    period: None,
                });

                marker = next;
            }
        }
        Ok(())
    }
}

/// `floor(base * factor^level)`.
fn scale(base: Decimal, factor: Decimal, level: u32) -> Result<Decimal, RulesError> {
    let mut value = base;
    for _ in 0..level {
        value = value
            .checked_mul(factor)
            .ok_or(RulesError::Overflow { level })?;
    }
    Ok(value.floor())
}

fn default_refill_energy_amount() -> Decimal {
    Decimal::from(50_u32)
}
