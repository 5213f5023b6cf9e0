//! Rule generators for Tally economies.
//!
//! A rule generator turns a compact set of game-design parameters into a
//! full [`tally_core::EconomyConfig`], so designers tune a handful of numbers
//! instead of hand-writing every conversion.
//!
//! # Modules
//!
//! - [`poker_tales`] -- Poker table, theft chain and story progression.
//! - [`error`] -- [`RulesError`] for loading and generation failures.

pub mod error;
pub mod poker_tales;

pub use error::RulesError;
pub use poker_tales::{
    PokerOutcome, PokerRules, PokerTalesRules, StoryRules, StorySubLevel, TheftOutcome,
    TheftRules,
};
