//! Conversions: recipes that consume inputs and pay one weighted outcome.
//!
//! A [`Conversion`] is built once from a [`ConversionSpec`] against a
//! [`Ledger`], resolving every item name to an [`ItemId`]. After that it is
//! structurally immutable; executing it only moves balances in the ledger it
//! is handed.
//!
//! # Outcome selection
//!
//! Outcome `i` owns the frequency range `[begin_i, end_i)` where
//! `end_i = begin_i + freq_i` and `begin_0 = 0`. The ranges partition
//! `[0, total_freq)`, so a uniform draw in that interval lands in exactly one
//! outcome. A zero-frequency outcome owns an empty range and is never chosen.
//!
//! # Payout clamps
//!
//! Each win applies two independent clamps, in order:
//!
//! 1. `total_limit` (per win): if the new balance would exceed it, the
//!    balance is set to the limit. This is absolute and can lower a balance
//!    that was already above the limit.
//! 2. `max` (per item): the balance is capped at the item's hard cap.

use std::ops::Range;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::trace;

use crate::config::{ConversionSpec, InputSpec, OutcomeSpec, WinSpec};
use crate::error::{SimulationError, VerificationError};
use crate::ledger::{ItemId, Ledger};

/// An amount of an item a conversion consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionInput {
    item: ItemId,
    amount: Decimal,
    force: bool,
}

impl ConversionInput {
    fn build(name: &str, spec: &InputSpec, ledger: &Ledger) -> Result<Self, VerificationError> {
        if spec.amount.is_sign_negative() {
            return Err(VerificationError::NegativeAmount {
                field: "inputs",
                item: name.to_owned(),
                amount: spec.amount,
            });
        }
        Ok(Self {
            item: ledger.resolve(name)?,
            amount: spec.amount,
            force: spec.force,
        })
    }

    /// The consumed item.
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Whether this input allows execution right now.
    pub fn can_spend(&self, ledger: &Ledger) -> bool {
        self.force || ledger.amount(self.item) >= self.amount
    }

    /// Remove the required amount, flooring the balance at zero.
    pub fn spend(&self, ledger: &mut Ledger) {
        if let Some(item) = ledger.item_mut(self.item) {
            item.amount = item.amount.saturating_sub(self.amount).max(Decimal::ZERO);
        }
    }
}

/// A single payout of an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWin {
    item: ItemId,
    amount: Decimal,
    total_limit: Option<Decimal>,
}

impl ConversionWin {
    fn build(name: &str, spec: &WinSpec, ledger: &Ledger) -> Result<Self, VerificationError> {
        if spec.amount.is_sign_negative() {
            return Err(VerificationError::NegativeAmount {
                field: "wins",
                item: name.to_owned(),
                amount: spec.amount,
            });
        }
        if let Some(limit) = spec.total_limit.filter(Decimal::is_sign_negative) {
            return Err(VerificationError::NegativeAmount {
                field: "totalLimit",
                item: name.to_owned(),
                amount: limit,
            });
        }
        Ok(Self {
            item: ledger.resolve(name)?,
            amount: spec.amount,
            total_limit: spec.total_limit.filter(|limit| !limit.is_zero()),
        })
    }

    /// The credited item.
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Credit the win, then apply the total limit and the item cap.
    pub fn pay(&self, ledger: &mut Ledger) {
        let Some(item) = ledger.item_mut(self.item) else {
            return;
        };

        let next = item.amount.saturating_add(self.amount);
        item.amount = match self.total_limit {
            Some(limit) if next > limit => limit,
            _ => next,
        };

        if let Some(max) = item.max {
            if item.amount > max {
                item.amount = max;
            }
        }
    }
}

/// One weighted branch of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    freq_begin: u64,
    freq_end: u64,
    wins: Vec<ConversionWin>,
}

impl Outcome {
    fn build(
        spec: &OutcomeSpec,
        freq_begin: u64,
        conversion: usize,
        ledger: &Ledger,
    ) -> Result<Self, VerificationError> {
        let freq_end = freq_begin
            .checked_add(spec.freq)
            .ok_or(VerificationError::FrequencyOverflow { conversion })?;
        let wins = spec
            .wins
            .iter()
            .map(|(name, win)| ConversionWin::build(name, win, ledger))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            freq_begin,
            freq_end,
            wins,
        })
    }

    /// The draws that select this outcome.
    pub const fn range(&self) -> Range<u64> {
        self.freq_begin..self.freq_end
    }

    /// Payouts made when this outcome is selected.
    pub fn wins(&self) -> &[ConversionWin] {
        &self.wins
    }

    fn covers(&self, draw: u64) -> bool {
        self.freq_begin <= draw && draw < self.freq_end
    }

    fn pay_wins(&self, ledger: &mut Ledger) {
        for win in &self.wins {
            win.pay(ledger);
        }
    }
}

/// A recipe: inputs plus an ordered, weighted outcome table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    inputs: Vec<ConversionInput>,
    outcomes: Vec<Outcome>,
    total_freq: u64,
}

impl Conversion {
    /// Resolve a spec against a ledger.
    ///
    /// `position` is the conversion's index in the configuration, used only
    /// for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] for unknown items, negative amounts, or
    /// a total outcome frequency of zero.
    pub fn build(
        spec: &ConversionSpec,
        position: usize,
        ledger: &Ledger,
    ) -> Result<Self, VerificationError> {
        let inputs = spec
            .inputs
            .iter()
            .map(|(name, input)| ConversionInput::build(name, input, ledger))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcomes = Vec::with_capacity(spec.outcomes.len());
        let mut total_freq = 0_u64;
        for outcome_spec in &spec.outcomes {
            let outcome = Outcome::build(outcome_spec, total_freq, position, ledger)?;
            total_freq = outcome.freq_end;
            outcomes.push(outcome);
        }

        if total_freq == 0 {
            return Err(VerificationError::ZeroTotalFrequency {
                conversion: position,
            });
        }

        Ok(Self {
            inputs,
            outcomes,
            total_freq,
        })
    }

    /// Consumed items.
    pub fn inputs(&self) -> &[ConversionInput] {
        &self.inputs
    }

    /// Outcomes in declaration order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Sum of all outcome frequencies.
    pub const fn total_freq(&self) -> u64 {
        self.total_freq
    }

    /// Whether some input can ever block execution: an unforced input with a
    /// positive amount.
    pub fn has_blocking_input(&self) -> bool {
        self.inputs
            .iter()
            .any(|input| !input.force && input.amount > Decimal::ZERO)
    }

    /// Whether every input can be spent right now.
    pub fn can_execute(&self, ledger: &Ledger) -> bool {
        self.inputs.iter().all(|input| input.can_spend(ledger))
    }

    /// Index of the outcome selected by `draw`.
    pub fn select(&self, draw: u64) -> Option<usize> {
        self.outcomes.iter().position(|outcome| outcome.covers(draw))
    }

    /// Spend every input, draw an outcome and pay its wins.
    ///
    /// Affordability is not re-checked; callers gate on
    /// [`can_execute`](Self::can_execute) where it matters. Returns the index
    /// of the paid outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NoOutcome`] if the draw matches no outcome,
    /// which construction rules out.
    pub fn execute<R: Rng>(
        &self,
        ledger: &mut Ledger,
        rng: &mut R,
    ) -> Result<usize, SimulationError> {
        for input in &self.inputs {
            input.spend(ledger);
        }

        let draw = if self.total_freq == 0 {
            0
        } else {
            rng.random_range(0..self.total_freq)
        };
        let index = self.select(draw).ok_or(SimulationError::NoOutcome {
            draw,
            total: self.total_freq,
        })?;
        trace!(draw, outcome = index, "Outcome selected");

        if let Some(outcome) = self.outcomes.get(index) {
            outcome.pay_wins(ledger);
        }
        Ok(index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::EconomyConfig;

    fn ledger() -> Ledger {
        let mut config = EconomyConfig {
            items: vec!["gold".to_owned(), "energy".to_owned()],
            ..EconomyConfig::default()
        };
        config.items_max.insert("umbrella".to_owned(), dec!(3));
        config.init_amounts.insert("gold".to_owned(), dec!(10));
        Ledger::initialize(&config).unwrap()
    }

    fn outcome(freq: u64, wins: &[(&str, WinSpec)]) -> OutcomeSpec {
        OutcomeSpec {
            freq,
            wins: wins
                .iter()
                .map(|(name, win)| ((*name).to_owned(), win.clone()))
                .collect(),
        }
    }

    fn spec(inputs: &[(&str, InputSpec)], outcomes: Vec<OutcomeSpec>) -> ConversionSpec {
        ConversionSpec {
            inputs: inputs
                .iter()
                .map(|(name, input)| ((*name).to_owned(), input.clone()))
                .collect::<BTreeMap<_, _>>(),
            outcomes,
            period: None,
        }
    }

    fn amount(ledger: &Ledger, name: &str) -> Decimal {
        ledger.get(name).unwrap().amount()
    }

    #[test]
    fn ranges_partition_total_frequency() {
        let ledger = ledger();
        let conv = Conversion::build(
            &spec(
                &[],
                vec![outcome(1, &[]), outcome(0, &[]), outcome(2, &[]), outcome(5, &[])],
            ),
            0,
            &ledger,
        )
        .unwrap();

        let ranges: Vec<Range<u64>> = conv.outcomes().iter().map(Outcome::range).collect();
        assert_eq!(ranges, vec![0..1, 1..1, 1..3, 3..8]);
        assert_eq!(conv.total_freq(), 8);

        let first = ranges.first().unwrap();
        let last = ranges.last().unwrap();
        assert_eq!(first.start, 0);
        assert_eq!(last.end, conv.total_freq());
        for pair in ranges.windows(2) {
            assert_eq!(pair.first().unwrap().end, pair.get(1).unwrap().start);
        }
    }

    #[test]
    fn every_draw_selects_exactly_one_nonempty_outcome() {
        let ledger = ledger();
        let conv = Conversion::build(
            &spec(&[], vec![outcome(0, &[]), outcome(2, &[]), outcome(0, &[]), outcome(1, &[])]),
            0,
            &ledger,
        )
        .unwrap();

        assert_eq!(conv.select(0), Some(1));
        assert_eq!(conv.select(1), Some(1));
        assert_eq!(conv.select(2), Some(3));
        assert_eq!(conv.select(3), None);
    }

    #[test]
    fn zero_total_frequency_is_rejected() {
        let ledger = ledger();
        let result = Conversion::build(&spec(&[], vec![outcome(0, &[]), outcome(0, &[])]), 4, &ledger);
        assert_eq!(
            result,
            Err(VerificationError::ZeroTotalFrequency { conversion: 4 })
        );

        let result = Conversion::build(&spec(&[], vec![]), 0, &ledger);
        assert!(matches!(result, Err(VerificationError::ZeroTotalFrequency { .. })));
    }

    #[test]
    fn frequency_overflow_is_rejected() {
        let ledger = ledger();
        let result = Conversion::build(
            &spec(&[], vec![outcome(u64::MAX, &[]), outcome(1, &[])]),
            2,
            &ledger,
        );
        assert_eq!(result, Err(VerificationError::FrequencyOverflow { conversion: 2 }));
    }

    #[test]
    fn unknown_items_are_rejected() {
        let ledger = ledger();
        let bad_input = spec(&[("crown", InputSpec::new(dec!(1)))], vec![outcome(1, &[])]);
        assert!(matches!(
            Conversion::build(&bad_input, 0, &ledger),
            Err(VerificationError::UnknownItem { name }) if name == "crown"
        ));

        let bad_win = spec(&[], vec![outcome(1, &[("anchor", WinSpec::new(dec!(1)))])]);
        assert!(matches!(
            Conversion::build(&bad_win, 0, &ledger),
            Err(VerificationError::UnknownItem { name }) if name == "anchor"
        ));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let ledger = ledger();
        let negative_win = spec(&[], vec![outcome(1, &[("gold", WinSpec::new(dec!(-1)))])]);
        assert!(matches!(
            Conversion::build(&negative_win, 0, &ledger),
            Err(VerificationError::NegativeAmount { field: "wins", .. })
        ));

        let negative_limit = spec(
            &[],
            vec![outcome(1, &[("gold", WinSpec::limited(dec!(1), dec!(-3)))])],
        );
        assert!(matches!(
            Conversion::build(&negative_limit, 0, &ledger),
            Err(VerificationError::NegativeAmount { field: "totalLimit", .. })
        ));
    }

    #[test]
    fn unforced_input_blocks_when_unaffordable() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(&[("gold", InputSpec::new(dec!(4)))], vec![outcome(1, &[])]),
            0,
            &ledger,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        assert!(conv.can_execute(&ledger));
        conv.execute(&mut ledger, &mut rng).unwrap();
        conv.execute(&mut ledger, &mut rng).unwrap();
        assert_eq!(amount(&ledger, "gold"), dec!(2));
        assert!(!conv.can_execute(&ledger));
    }

    #[test]
    fn forced_input_always_spendable_and_floors_at_zero() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(&[("gold", InputSpec::forced(dec!(25)))], vec![outcome(1, &[])]),
            0,
            &ledger,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        assert!(conv.can_execute(&ledger));
        conv.execute(&mut ledger, &mut rng).unwrap();
        assert_eq!(amount(&ledger, "gold"), Decimal::ZERO);
        assert!(conv.can_execute(&ledger));
        conv.execute(&mut ledger, &mut rng).unwrap();
        assert_eq!(amount(&ledger, "gold"), Decimal::ZERO);
        assert!(!conv.has_blocking_input());
    }

    #[test]
    fn execute_ignores_affordability() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(
                &[("energy", InputSpec::new(dec!(1)))],
                vec![outcome(1, &[("gold", WinSpec::new(dec!(5)))])],
            ),
            0,
            &ledger,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        assert!(!conv.can_execute(&ledger));
        conv.execute(&mut ledger, &mut rng).unwrap();
        assert_eq!(amount(&ledger, "energy"), Decimal::ZERO);
        assert_eq!(amount(&ledger, "gold"), dec!(15));
    }

    #[test]
    fn total_limit_clamps_resulting_balance() {
        let mut ledger = ledger();
        let win = ConversionWin::build("energy", &WinSpec::limited(dec!(3), dec!(5)), &ledger).unwrap();

        win.pay(&mut ledger);
        assert_eq!(amount(&ledger, "energy"), dec!(3));
        win.pay(&mut ledger);
        assert_eq!(amount(&ledger, "energy"), dec!(5));
        win.pay(&mut ledger);
        assert_eq!(amount(&ledger, "energy"), dec!(5));
    }

    #[test]
    fn total_limit_can_lower_a_higher_balance() {
        let mut ledger = ledger();
        let win = ConversionWin::build("gold", &WinSpec::limited(dec!(1), dec!(4)), &ledger).unwrap();

        assert_eq!(amount(&ledger, "gold"), dec!(10));
        win.pay(&mut ledger);
        assert_eq!(amount(&ledger, "gold"), dec!(4));
    }

    #[test]
    fn zero_total_limit_means_unlimited() {
        let mut ledger = ledger();
        let win =
            ConversionWin::build("gold", &WinSpec::limited(dec!(5), Decimal::ZERO), &ledger).unwrap();

        win.pay(&mut ledger);
        win.pay(&mut ledger);
        assert_eq!(amount(&ledger, "gold"), dec!(20));
    }

    #[test]
    fn item_cap_applies_after_total_limit() {
        let mut ledger = ledger();
        let plain = ConversionWin::build("umbrella", &WinSpec::new(dec!(2)), &ledger).unwrap();
        let limited =
            ConversionWin::build("umbrella", &WinSpec::limited(dec!(10), dec!(8)), &ledger).unwrap();

        plain.pay(&mut ledger);
        assert_eq!(amount(&ledger, "umbrella"), dec!(2));
        plain.pay(&mut ledger);
        assert_eq!(amount(&ledger, "umbrella"), dec!(3));
        limited.pay(&mut ledger);
        assert_eq!(amount(&ledger, "umbrella"), dec!(3));
    }

    #[test]
    fn zero_frequency_outcome_never_pays() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(
                &[],
                vec![
                    outcome(0, &[("energy", WinSpec::new(dec!(1)))]),
                    outcome(3, &[("gold", WinSpec::new(dec!(1)))]),
                ],
            ),
            0,
            &ledger,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..50 {
            assert_eq!(conv.execute(&mut ledger, &mut rng).unwrap(), 1);
        }
        assert_eq!(amount(&ledger, "energy"), Decimal::ZERO);
        assert_eq!(amount(&ledger, "gold"), dec!(60));
    }

    #[test]
    fn draws_follow_frequency_weights() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(&[], vec![outcome(1, &[]), outcome(3, &[])]),
            0,
            &ledger,
        )
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(42);

        let mut counts = [0_u32; 2];
        for _ in 0..10_000 {
            let index = conv.execute(&mut ledger, &mut rng).unwrap();
            if let Some(count) = counts.get_mut(index) {
                *count += 1;
            }
        }
        let [low, high] = counts;
        assert_eq!(low + high, 10_000);
        assert!((2_000..3_000).contains(&low), "low weight drawn {low} times");
        assert!((7_000..8_000).contains(&high), "high weight drawn {high} times");
    }

    #[test]
    fn same_seed_same_outcomes() {
        let mut ledger = ledger();
        let conv = Conversion::build(
            &spec(&[], vec![outcome(1, &[]), outcome(1, &[]), outcome(1, &[])]),
            0,
            &ledger,
        )
        .unwrap();

        let mut first = SmallRng::seed_from_u64(99);
        let mut second = SmallRng::seed_from_u64(99);
        for _ in 0..100 {
            assert_eq!(
                conv.execute(&mut ledger, &mut first).unwrap(),
                conv.execute(&mut ledger, &mut second).unwrap()
            );
        }
    }
}
