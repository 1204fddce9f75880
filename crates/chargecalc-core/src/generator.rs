//! # Combination Generator
//!
//! Enumerates every non-empty subset of the base items and gives each one a
//! code, a label, an acronym and a numeric id.
//!
//! ## Numbering
//! ```text
//! ordinal i     code (N = 4)   id
//! ─────────     ────────────   ──────────
//!     1           0001         base + 1
//!     2           0010         base + 2
//!     3           0011         base + 3
//!    ...           ...          ...
//!  2^N - 1        1111         base + 2^N - 1
//! ```
//!
//! The code of ordinal `i` is the binary expansion of `i` padded to N digits,
//! so two ordinals never share a code and ids grow with `i`.

use std::collections::BTreeSet;

use crate::base_item::BaseItemCatalog;
use crate::code::Code;
use crate::error::CatalogError;
use crate::types::CalculationTypeId;

/// One generated subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    /// Position in enumeration order, `1..=2^N - 1`.
    pub ordinal: u64,
    pub id: CalculationTypeId,
    pub code: Code,
    /// Digit positions present in the subset.
    pub positions: BTreeSet<usize>,
    /// Full labels joined with `.`.
    pub label: String,
    /// Acronyms joined with `_`.
    pub acronym: String,
}

/// Total number of non-empty subsets of `width` items.
#[inline]
pub fn combination_count(width: usize) -> u64 {
    (1u64 << width) - 1
}

/// Checks that ids `base + 1 ..= base + 2^width` fit an `i32`.
///
/// The extra slot after the generated range is reserved for the extension
/// entries of the calculation type catalog.
pub fn check_id_range(base: i32, width: usize) -> Result<(), CatalogError> {
    let count = combination_count(width);
    let last = i64::from(base) + count as i64 + 1;
    if base < 0 || last > i64::from(i32::MAX) {
        return Err(CatalogError::IdRangeOverflow { base, count });
    }
    Ok(())
}

// =============================================================================
// Generator
// =============================================================================

/// Deterministic enumerator over a base item catalog.
///
/// ## Example
/// ```rust
/// use chargecalc_core::base_item::BaseItemCatalog;
/// use chargecalc_core::generator::CombinationGenerator;
/// use chargecalc_core::BaseItemKind;
///
/// let items = BaseItemCatalog::new([BaseItemKind::Aval, BaseItemKind::Honorarios]).unwrap();
/// let generator = CombinationGenerator::new(&items, 100).unwrap();
///
/// let codes: Vec<String> = generator.iter().map(|c| c.code.to_string()).collect();
/// assert_eq!(codes, vec!["01", "10", "11"]);
/// assert_eq!(generator.combination(3).unwrap().label, "Aval.Honorarios");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CombinationGenerator<'a> {
    items: &'a BaseItemCatalog,
    id_base: i32,
}

impl<'a> CombinationGenerator<'a> {
    /// Creates a generator whose first id is `id_base + 1`.
    pub fn new(items: &'a BaseItemCatalog, id_base: i32) -> Result<Self, CatalogError> {
        // A BaseItemCatalog is never empty, this only guards the id range.
        check_id_range(id_base, items.width())?;
        Ok(Self::new_unchecked(items, id_base))
    }

    pub(crate) fn new_unchecked(items: &'a BaseItemCatalog, id_base: i32) -> Self {
        CombinationGenerator { items, id_base }
    }

    /// Number of combinations produced.
    #[inline]
    pub fn len(&self) -> u64 {
        combination_count(self.items.width())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The combination for one ordinal, `None` outside `1..=2^N - 1`.
    pub fn combination(&self, ordinal: u64) -> Option<Combination> {
        if ordinal == 0 || ordinal > self.len() {
            return None;
        }

        let width = self.items.width();
        let code = Code::from_mask(ordinal, width);
        let positions = code.positions();

        let present: Vec<_> = self
            .items
            .items()
            .iter()
            .filter(|item| positions.contains(&item.index))
            .collect();

        let label = present
            .iter()
            .map(|item| item.full_label.as_str())
            .collect::<Vec<_>>()
            .join(".");
        let acronym = present
            .iter()
            .map(|item| item.acronym.as_str())
            .collect::<Vec<_>>()
            .join("_");

        Some(Combination {
            ordinal,
            id: CalculationTypeId::new(self.id_base + ordinal as i32),
            code,
            positions,
            label,
            acronym,
        })
    }

    /// Iterates every combination in ascending ordinal order.
    pub fn iter(&self) -> Combinations<'a> {
        Combinations {
            generator: *self,
            next: 1,
        }
    }
}

impl<'a> IntoIterator for CombinationGenerator<'a> {
    type Item = Combination;
    type IntoIter = Combinations<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`CombinationGenerator::iter`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    generator: CombinationGenerator<'a>,
    next: u64,
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Self::Item> {
        let combination = self.generator.combination(self.next)?;
        self.next += 1;
        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.generator.len() + 1).saturating_sub(self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Combinations<'_> {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaseItemKind;

    fn three_items() -> BaseItemCatalog {
        BaseItemCatalog::new([
            BaseItemKind::Flat,
            BaseItemKind::MandatoryInsurance,
            BaseItemKind::Honorarios,
        ])
        .unwrap()
    }

    #[test]
    fn test_count_and_codes() {
        let items = three_items();
        let generator = CombinationGenerator::new(&items, 100).unwrap();
        assert_eq!(generator.len(), 7);
        assert_eq!(generator.iter().len(), 7);

        let codes: Vec<String> = generator.iter().map(|c| c.code.to_string()).collect();
        assert_eq!(codes, vec!["001", "010", "011", "100", "101", "110", "111"]);
    }

    #[test]
    fn test_labels_and_acronyms_follow_index_order() {
        let items = three_items();
        let generator = CombinationGenerator::new(&items, 100).unwrap();

        let all = generator.combination(7).unwrap();
        assert_eq!(all.label, "Flat.Mandatory Insurance.Honorarios");
        assert_eq!(all.acronym, "FLAT_MI_HO");

        let single = generator.combination(4).unwrap();
        assert_eq!(single.label, "Flat");
        assert_eq!(single.positions.into_iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_ids_start_after_base() {
        let items = three_items();
        let generator = CombinationGenerator::new(&items, 500).unwrap();
        let ids: Vec<i32> = generator.iter().map(|c| c.id.value()).collect();
        assert_eq!(ids, vec![501, 502, 503, 504, 505, 506, 507]);
    }

    #[test]
    fn test_out_of_range_ordinals() {
        let items = three_items();
        let generator = CombinationGenerator::new(&items, 100).unwrap();
        assert!(generator.combination(0).is_none());
        assert!(generator.combination(8).is_none());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let items = three_items();
        let first: Vec<Combination> = CombinationGenerator::new(&items, 100).unwrap().iter().collect();
        let second: Vec<Combination> = CombinationGenerator::new(&items, 100)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_id_range_overflow_rejected() {
        let items = three_items();
        assert!(matches!(
            CombinationGenerator::new(&items, i32::MAX - 3),
            Err(CatalogError::IdRangeOverflow { .. })
        ));
        assert!(CombinationGenerator::new(&items, -1).is_err());
        assert!(check_id_range(i32::MAX - 8, 3).is_ok());
    }
}
