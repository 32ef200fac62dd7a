//! Per-category figures.
//!
//! [`CategoryAmounts`] always holds one amount for every [`PaymentCategory`];
//! a category nobody touched is zero, never missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{MoneyCents, PaymentCategory};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<PaymentCategory, MoneyCents>",
    into = "BTreeMap<PaymentCategory, MoneyCents>"
)]
pub struct CategoryAmounts([MoneyCents; PaymentCategory::ALL.len()]);

impl CategoryAmounts {
    pub const ZERO: CategoryAmounts = CategoryAmounts([MoneyCents::ZERO; 5]);

    #[must_use]
    pub fn get(&self, category: PaymentCategory) -> MoneyCents {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: PaymentCategory, amount: MoneyCents) {
        self.0[category.index()] = amount;
    }

    /// Builder-style [`CategoryAmounts::set`].
    #[must_use]
    pub fn with(mut self, category: PaymentCategory, amount: MoneyCents) -> Self {
        self.set(category, amount);
        self
    }

    /// Adds `amount` to `category`; `None` on overflow.
    #[must_use]
    pub fn checked_add(mut self, category: PaymentCategory, amount: MoneyCents) -> Option<Self> {
        let slot = &mut self.0[category.index()];
        *slot = slot.checked_add(amount)?;
        Some(self)
    }

    /// Sum over all categories; `None` on overflow.
    #[must_use]
    pub fn checked_total(&self) -> Option<MoneyCents> {
        self.0
            .iter()
            .try_fold(MoneyCents::ZERO, |acc, amount| acc.checked_add(*amount))
    }

    /// Category-wise `self - rhs`; `None` on overflow.
    #[must_use]
    pub fn checked_sub(&self, rhs: &CategoryAmounts) -> Option<CategoryAmounts> {
        let mut out = Self::ZERO;
        for category in PaymentCategory::ALL {
            out.set(category, self.get(category).checked_sub(rhs.get(category))?);
        }
        Some(out)
    }

    /// `true` when some category's absolute value reaches `threshold`.
    #[must_use]
    pub fn any_at_least(&self, threshold: MoneyCents) -> bool {
        self.0.iter().any(|amount| amount.abs() >= threshold)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaymentCategory, MoneyCents)> + '_ {
        PaymentCategory::ALL
            .into_iter()
            .map(|category| (category, self.get(category)))
    }
}

impl FromIterator<(PaymentCategory, MoneyCents)> for CategoryAmounts {
    /// Later entries for the same category overwrite earlier ones.
    fn from_iter<I: IntoIterator<Item = (PaymentCategory, MoneyCents)>>(iter: I) -> Self {
        let mut out = Self::ZERO;
        for (category, amount) in iter {
            out.set(category, amount);
        }
        out
    }
}

impl From<BTreeMap<PaymentCategory, MoneyCents>> for CategoryAmounts {
    fn from(map: BTreeMap<PaymentCategory, MoneyCents>) -> Self {
        map.into_iter().collect()
    }
}

impl From<CategoryAmounts> for BTreeMap<PaymentCategory, MoneyCents> {
    fn from(amounts: CategoryAmounts) -> Self {
        amounts.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_categories_are_zero() {
        let amounts: CategoryAmounts = [(PaymentCategory::Cash, MoneyCents::new(4800))]
            .into_iter()
            .collect();
        assert_eq!(amounts.get(PaymentCategory::Cash), MoneyCents::new(4800));
        for category in &PaymentCategory::ALL[1..] {
            assert_eq!(amounts.get(*category), MoneyCents::ZERO);
        }
    }

    #[test]
    fn diff_is_counted_minus_expected() {
        let counted = CategoryAmounts::ZERO
            .with(PaymentCategory::Cash, MoneyCents::new(4800))
            .with(PaymentCategory::DebitCard, MoneyCents::new(1000));
        let expected = CategoryAmounts::ZERO.with(PaymentCategory::Cash, MoneyCents::new(5000));

        let diff = counted.checked_sub(&expected).unwrap();
        assert_eq!(diff.get(PaymentCategory::Cash), MoneyCents::new(-200));
        assert_eq!(diff.get(PaymentCategory::DebitCard), MoneyCents::new(1000));
        assert_eq!(diff.get(PaymentCategory::Other), MoneyCents::ZERO);
    }

    #[test]
    fn threshold_is_inclusive_and_sign_blind() {
        let one_cent_short = CategoryAmounts::ZERO.with(PaymentCategory::Other, MoneyCents::new(-1));
        assert!(one_cent_short.any_at_least(MoneyCents::MINOR_UNIT));
        assert!(!CategoryAmounts::ZERO.any_at_least(MoneyCents::MINOR_UNIT));
    }

    #[test]
    fn total_reports_overflow() {
        let huge = CategoryAmounts::ZERO
            .with(PaymentCategory::Cash, MoneyCents::new(i64::MAX))
            .with(PaymentCategory::Other, MoneyCents::new(1));
        assert_eq!(huge.checked_total(), None);
        assert_eq!(
            CategoryAmounts::ZERO
                .checked_add(PaymentCategory::Cash, MoneyCents::new(i64::MAX))
                .and_then(|a| a.checked_add(PaymentCategory::Cash, MoneyCents::new(1))),
            None
        );
    }

    #[test]
    fn serializes_as_full_category_map() {
        let json = serde_json::to_value(
            CategoryAmounts::ZERO.with(PaymentCategory::InstantTransfer, MoneyCents::new(2000)),
        )
        .unwrap();
        assert_eq!(json["instant_transfer"], 2000);
        assert_eq!(json["cash"], 0);
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
