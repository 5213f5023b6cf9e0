//! The item ledger: every resource balance in one economy.
//!
//! The [`Ledger`] owns all [`Item`] records. Conversions never hold items;
//! they hold [`ItemId`]s resolved once at construction, and the driver lends
//! them the ledger whenever they execute. Name lookups are a construction-time
//! concern only.
//!
//! # Invariants
//!
//! - The item set is fixed at construction.
//! - Balances never go negative.
//! - A capped balance never exceeds its cap after a payout. [`Ledger::reset`]
//!   restores configured starting balances verbatim and does not re-clamp, so
//!   a starting balance above the cap survives until the next payout.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::config::EconomyConfig;
use crate::error::VerificationError;

/// Immutable name-to-balance view of a ledger, ordered by item name.
pub type Snapshot = BTreeMap<String, Decimal>;

/// Index of an item inside its [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(usize);

/// A named resource balance with an optional hard cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub(crate) amount: Decimal,
    pub(crate) max: Option<Decimal>,
}

impl Item {
    /// Current balance.
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Hard cap, if the item has one.
    pub const fn max(&self) -> Option<Decimal> {
        self.max
    }
}

/// All items of one economy, addressed by [`ItemId`].
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Item records, indexed by `ItemId`.
    items: Vec<Item>,
    /// Item names, parallel to `items`.
    names: Vec<String>,
    /// Configured starting balances, parallel to `items`.
    initial: Vec<Decimal>,
    /// Name lookup.
    index: BTreeMap<String, ItemId>,
}

impl Ledger {
    /// Build the item set from a configuration and apply starting balances.
    ///
    /// Items are the union of `items` and the keys of `itemsMax`; a name
    /// listed in both takes the cap. A cap of zero means uncapped.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::UnknownItem`] if a starting balance names
    /// an undeclared item, or [`VerificationError::NegativeAmount`] for a
    /// negative cap or starting balance.
    pub fn initialize(config: &EconomyConfig) -> Result<Self, VerificationError> {
        let mut ledger = Self::default();

        for name in &config.items {
            ledger.declare(name, None);
        }
        for (name, max) in &config.items_max {
            if max.is_sign_negative() {
                return Err(VerificationError::NegativeAmount {
                    field: "itemsMax",
                    item: name.clone(),
                    amount: *max,
                });
            }
            ledger.declare(name, Some(*max).filter(|max| !max.is_zero()));
        }

        for (name, amount) in &config.init_amounts {
            if amount.is_sign_negative() {
                return Err(VerificationError::NegativeAmount {
                    field: "initAmounts",
                    item: name.clone(),
                    amount: *amount,
                });
            }
            let id = ledger.resolve(name)?;
            if let Some(item) = ledger.items.get_mut(id.0) {
                item.amount = *amount;
            }
            if let Some(initial) = ledger.initial.get_mut(id.0) {
                *initial = *amount;
            }
        }

        Ok(ledger)
    }

    /// Add an item, or set the cap of an existing one.
    fn declare(&mut self, name: &str, max: Option<Decimal>) {
        if let Some(id) = self.index.get(name) {
            if let Some(item) = self.items.get_mut(id.0) {
                if max.is_some() {
                    item.max = max;
                }
            }
            return;
        }

        let id = ItemId(self.items.len());
        self.items.push(Item {
            amount: Decimal::ZERO,
            max,
        });
        self.names.push(name.to_owned());
        self.initial.push(Decimal::ZERO);
        self.index.insert(name.to_owned(), id);
    }

    /// Look up the id of a named item.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::UnknownItem`] if no such item exists.
    pub fn resolve(&self, name: &str) -> Result<ItemId, VerificationError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| VerificationError::UnknownItem {
                name: name.to_owned(),
            })
    }

    /// Look up a named item.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::UnknownItem`] if no such item exists.
    pub fn get(&self, name: &str) -> Result<&Item, VerificationError> {
        let id = self.resolve(name)?;
        self.items
            .get(id.0)
            .ok_or_else(|| VerificationError::UnknownItem {
                name: name.to_owned(),
            })
    }

    /// The item behind an id.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.0)
    }

    /// Current balance of an item; zero for an id from another ledger.
    pub fn amount(&self, id: ItemId) -> Decimal {
        self.item(id).map_or(Decimal::ZERO, Item::amount)
    }

    /// Name of an item.
    pub fn name(&self, id: ItemId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Number of items.
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the ledger has no items.
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Restore every balance to its configured starting amount.
    pub fn reset(&mut self) {
        for (item, initial) in self.items.iter_mut().zip(&self.initial) {
            item.amount = *initial;
        }
    }

    /// Copy out every balance by name.
    pub fn snapshot(&self) -> Snapshot {
        self.names
            .iter()
            .zip(&self.items)
            .map(|(name, item)| (name.clone(), item.amount))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> EconomyConfig {
        let mut config = EconomyConfig {
            items: vec!["gold".to_owned(), "energy".to_owned()],
            ..EconomyConfig::default()
        };
        config.items_max.insert("umbrella".to_owned(), dec!(3));
        config.init_amounts.insert("energy".to_owned(), dec!(500));
        config
    }

    #[test]
    fn item_set_is_union_of_plain_and_capped() {
        let ledger = Ledger::initialize(&config()).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get("gold").unwrap().max(), None);
        assert_eq!(ledger.get("umbrella").unwrap().max(), Some(dec!(3)));
    }

    #[test]
    fn starting_balances_default_to_zero() {
        let ledger = Ledger::initialize(&config()).unwrap();
        assert_eq!(ledger.get("energy").unwrap().amount(), dec!(500));
        assert_eq!(ledger.get("gold").unwrap().amount(), Decimal::ZERO);
        assert_eq!(ledger.get("umbrella").unwrap().amount(), Decimal::ZERO);
    }

    #[test]
    fn cap_applies_to_item_listed_twice() {
        let mut config = config();
        config.items_max.insert("gold".to_owned(), dec!(10));
        let ledger = Ledger::initialize(&config).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get("gold").unwrap().max(), Some(dec!(10)));
    }

    #[test]
    fn zero_cap_means_uncapped() {
        let mut config = config();
        config.items_max.insert("gold".to_owned(), Decimal::ZERO);
        config.items_max.insert("egg".to_owned(), Decimal::ZERO);
        let ledger = Ledger::initialize(&config).unwrap();
        assert_eq!(ledger.get("gold").unwrap().max(), None);
        assert_eq!(ledger.get("egg").unwrap().max(), None);
    }

    #[test]
    fn unknown_name_is_verification_error() {
        let ledger = Ledger::initialize(&config()).unwrap();
        assert_eq!(
            ledger.resolve("crown"),
            Err(VerificationError::UnknownItem {
                name: "crown".to_owned()
            })
        );
        assert!(ledger.get("crown").is_err());
    }

    #[test]
    fn starting_balance_for_unknown_item_is_rejected() {
        let mut config = config();
        config.init_amounts.insert("crown".to_owned(), dec!(1));
        assert!(matches!(
            Ledger::initialize(&config),
            Err(VerificationError::UnknownItem { .. })
        ));
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut config = config();
        config.init_amounts.insert("gold".to_owned(), dec!(-1));
        assert!(matches!(
            Ledger::initialize(&config),
            Err(VerificationError::NegativeAmount { field: "initAmounts", .. })
        ));

        let mut config = self::config();
        config.items_max.insert("gold".to_owned(), dec!(-5));
        assert!(matches!(
            Ledger::initialize(&config),
            Err(VerificationError::NegativeAmount { field: "itemsMax", .. })
        ));
    }

    #[test]
    fn reset_restores_starting_balances() {
        let mut ledger = Ledger::initialize(&config()).unwrap();
        let energy = ledger.resolve("energy").unwrap();
        let gold = ledger.resolve("gold").unwrap();
        ledger.item_mut(energy).unwrap().amount = dec!(3);
        ledger.item_mut(gold).unwrap().amount = dec!(42);

        ledger.reset();

        assert_eq!(ledger.amount(energy), dec!(500));
        assert_eq!(ledger.amount(gold), Decimal::ZERO);
    }

    #[test]
    fn reset_does_not_clamp_to_cap() {
        let mut config = config();
        config.init_amounts.insert("umbrella".to_owned(), dec!(7));
        let mut ledger = Ledger::initialize(&config).unwrap();
        ledger.reset();
        assert_eq!(ledger.get("umbrella").unwrap().amount(), dec!(7));
    }

    #[test]
    fn snapshot_is_ordered_by_name() {
        let ledger = Ledger::initialize(&config()).unwrap();
        let snapshot = ledger.snapshot();
        let names: Vec<&String> = snapshot.keys().collect();
        assert_eq!(names, vec!["energy", "gold", "umbrella"]);
    }
}
