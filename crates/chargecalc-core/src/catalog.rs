//! # Calculation Type Catalog
//!
//! Registry of every charge calculation type, keyed by numeric id and by code.
//!
//! ## Contents
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Calculation Type Catalog                            │
//! │                                                                         │
//! │  id 0            INVALID sentinel (not an entry, never exported)        │
//! │  ids 1..=10      legacy simple types, no code                           │
//! │  ids base+1 ..   one entry per non-empty subset of the N base items     │
//! │  id base+2^N     extension entry (N+1 digit code)                       │
//! │                                                                         │
//! │  Built once, never mutated. Share it by reference.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::base_item::{BaseItemCatalog, STANDARD_WIDTH};
use crate::code::Code;
use crate::error::{CatalogError, LookupMiss};
use crate::generator::{check_id_range, combination_count, CombinationGenerator};
use crate::types::{BaseItemKind, CalculationTypeId};
use crate::DEFAULT_COMBINATION_ID_BASE;

/// Highest id reserved for the legacy simple types.
pub const LEGACY_MAX_ID: i32 = 10;

const _: () = assert!(DEFAULT_COMBINATION_ID_BASE >= LEGACY_MAX_ID);
const _: () = assert!(
    DEFAULT_COMBINATION_ID_BASE as i64 + (1i64 << STANDARD_WIDTH) <= i32::MAX as i64
);

// =============================================================================
// Simple (Legacy) Types
// =============================================================================

/// Calculation types that predate the combinatorial codes.
///
/// Their ids are fixed and are never generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimpleCalculation {
    Flat,
    PercentOfAmount,
    PercentOfAmountAndInterest,
    PercentOfInterest,
    PercentOfDisbursementAmount,
    PercentOfOutstandingPrincipalAmount,
    PercentOfOutstandingInterestAmount,
    PercentOfOutstandingPrincipalAndInterestAmount,
    PercentOfPrincipalTerm,
    PercentOfGuaranteeTerm,
}

impl SimpleCalculation {
    pub const ALL: [SimpleCalculation; 10] = [
        SimpleCalculation::Flat,
        SimpleCalculation::PercentOfAmount,
        SimpleCalculation::PercentOfAmountAndInterest,
        SimpleCalculation::PercentOfInterest,
        SimpleCalculation::PercentOfDisbursementAmount,
        SimpleCalculation::PercentOfOutstandingPrincipalAmount,
        SimpleCalculation::PercentOfOutstandingInterestAmount,
        SimpleCalculation::PercentOfOutstandingPrincipalAndInterestAmount,
        SimpleCalculation::PercentOfPrincipalTerm,
        SimpleCalculation::PercentOfGuaranteeTerm,
    ];

    pub fn id(&self) -> CalculationTypeId {
        let value = match self {
            SimpleCalculation::Flat => 1,
            SimpleCalculation::PercentOfAmount => 2,
            SimpleCalculation::PercentOfAmountAndInterest => 3,
            SimpleCalculation::PercentOfInterest => 4,
            SimpleCalculation::PercentOfDisbursementAmount => 5,
            SimpleCalculation::PercentOfOutstandingPrincipalAmount => 6,
            SimpleCalculation::PercentOfOutstandingInterestAmount => 7,
            SimpleCalculation::PercentOfOutstandingPrincipalAndInterestAmount => 8,
            SimpleCalculation::PercentOfPrincipalTerm => 9,
            SimpleCalculation::PercentOfGuaranteeTerm => 10,
        };
        CalculationTypeId::new(value)
    }

    pub fn from_id(id: CalculationTypeId) -> Option<Self> {
        match id.value() {
            1 => Some(SimpleCalculation::Flat),
            2 => Some(SimpleCalculation::PercentOfAmount),
            3 => Some(SimpleCalculation::PercentOfAmountAndInterest),
            4 => Some(SimpleCalculation::PercentOfInterest),
            5 => Some(SimpleCalculation::PercentOfDisbursementAmount),
            6 => Some(SimpleCalculation::PercentOfOutstandingPrincipalAmount),
            7 => Some(SimpleCalculation::PercentOfOutstandingInterestAmount),
            8 => Some(SimpleCalculation::PercentOfOutstandingPrincipalAndInterestAmount),
            9 => Some(SimpleCalculation::PercentOfPrincipalTerm),
            10 => Some(SimpleCalculation::PercentOfGuaranteeTerm),
            _ => None,
        }
    }

    /// Upper-case name, as shown in legacy exports.
    pub fn name(&self) -> &'static str {
        match self {
            SimpleCalculation::Flat => "FLAT",
            SimpleCalculation::PercentOfAmount => "PERCENT_OF_AMOUNT",
            SimpleCalculation::PercentOfAmountAndInterest => "PERCENT_OF_AMOUNT_AND_INTEREST",
            SimpleCalculation::PercentOfInterest => "PERCENT_OF_INTEREST",
            SimpleCalculation::PercentOfDisbursementAmount => "PERCENT_OF_DISBURSEMENT_AMOUNT",
            SimpleCalculation::PercentOfOutstandingPrincipalAmount => {
                "PERCENT_OF_OUTSTANDING_PRINCIPAL_AMOUNT"
            }
            SimpleCalculation::PercentOfOutstandingInterestAmount => {
                "PERCENT_OF_OUTSTANDING_INTEREST_AMOUNT"
            }
            SimpleCalculation::PercentOfOutstandingPrincipalAndInterestAmount => {
                "PERCENT_OF_OUTSTANDING_PRINCIPAL_AND_INTEREST_AMOUNT"
            }
            SimpleCalculation::PercentOfPrincipalTerm => "PERCENT_OF_PRINCIPAL_TERM",
            SimpleCalculation::PercentOfGuaranteeTerm => "PERCENT_OF_GUARANTEE_TERM",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SimpleCalculation::Flat => "Flat",
            SimpleCalculation::PercentOfAmount => "% Amount",
            SimpleCalculation::PercentOfAmountAndInterest => "% Loan Amount + Interest",
            SimpleCalculation::PercentOfInterest => "% Interest",
            SimpleCalculation::PercentOfDisbursementAmount => "% Disbursement Amount",
            SimpleCalculation::PercentOfOutstandingPrincipalAmount => {
                "% Outstanding Principal Amount"
            }
            SimpleCalculation::PercentOfOutstandingInterestAmount => {
                "% Outstanding Interest Amount"
            }
            SimpleCalculation::PercentOfOutstandingPrincipalAndInterestAmount => {
                "% Outstanding Principal + Interest Amount"
            }
            SimpleCalculation::PercentOfPrincipalTerm => "% Principal Term",
            SimpleCalculation::PercentOfGuaranteeTerm => "% Guarantee Term",
        }
    }
}

// =============================================================================
// Charge Calculation Type
// =============================================================================

/// What an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationKind {
    /// The `INVALID` sentinel returned by permissive lookups.
    Invalid,
    Simple(SimpleCalculation),
    /// Generated from a subset of the base items.
    Combination,
    /// Uses the extension digit.
    Extended,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeCalculationType {
    pub id: CalculationTypeId,
    pub kind: CalculationKind,
    /// `None` for the sentinel and the legacy simple types.
    pub code: Option<Code>,
    /// Digit positions present; empty when there is no code.
    pub combination: BTreeSet<usize>,
    pub label: String,
    pub acronym: String,
}

impl ChargeCalculationType {
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.kind == CalculationKind::Invalid
    }

    /// True for generated and extension entries.
    #[inline]
    pub fn is_combinatorial(&self) -> bool {
        matches!(
            self.kind,
            CalculationKind::Combination | CalculationKind::Extended
        )
    }

    /// Checks whether a digit position is part of this type.
    #[inline]
    pub fn contains(&self, position: usize) -> bool {
        self.combination.contains(&position)
    }

    fn invalid() -> Self {
        ChargeCalculationType {
            id: CalculationTypeId::INVALID,
            kind: CalculationKind::Invalid,
            code: None,
            combination: BTreeSet::new(),
            label: "Invalid".to_string(),
            acronym: "INVALID".to_string(),
        }
    }
}

impl fmt::Display for ChargeCalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}] {}", self.id, code, self.label),
            None => write!(f, "{} {}", self.id, self.label),
        }
    }
}

// =============================================================================
// Export Row
// =============================================================================

/// Read-only row handed to dropdown/enumeration consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogExportRow {
    pub id: i32,
    pub code: Option<String>,
    pub label: String,
    pub acronym: String,
}

impl From<&ChargeCalculationType> for CatalogExportRow {
    fn from(entry: &ChargeCalculationType) -> Self {
        CatalogExportRow {
            id: entry.id.value(),
            code: entry.code.as_ref().map(Code::to_string),
            label: entry.label.clone(),
            acronym: entry.acronym.clone(),
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Immutable registry of calculation types.
///
/// ## Example
/// ```rust
/// use chargecalc_core::catalog::standard_catalog;
/// use chargecalc_core::{BaseItemKind, Code};
///
/// let catalog = standard_catalog();
/// let code: Code = "0000001000".parse().unwrap();
/// let entry = catalog.lookup_code(&code).unwrap();
/// assert_eq!(entry.label, "Mandatory Insurance");
///
/// assert_eq!(
///     catalog.decode_kinds(&code).unwrap(),
///     vec![BaseItemKind::MandatoryInsurance]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CalculationTypeCatalog {
    base_items: BaseItemCatalog,
    id_base: i32,
    entries: Vec<ChargeCalculationType>,
    by_id: HashMap<CalculationTypeId, usize>,
    by_code: HashMap<String, usize>,
    invalid: ChargeCalculationType,
}

impl CalculationTypeCatalog {
    /// Builds the catalog over `base_items`, numbering combinations from
    /// `id_base + 1`.
    pub fn build(base_items: BaseItemCatalog, id_base: i32) -> Result<Self, CatalogError> {
        if id_base < LEGACY_MAX_ID {
            return Err(CatalogError::IdBaseCollision {
                base: id_base,
                reserved_max: LEGACY_MAX_ID,
            });
        }
        check_id_range(id_base, base_items.width())?;
        Ok(Self::assemble(base_items, id_base))
    }

    fn assemble(base_items: BaseItemCatalog, id_base: i32) -> Self {
        let mut entries = Vec::with_capacity(
            SimpleCalculation::ALL.len() + combination_count(base_items.width()) as usize + 1,
        );

        for simple in SimpleCalculation::ALL {
            entries.push(ChargeCalculationType {
                id: simple.id(),
                kind: CalculationKind::Simple(simple),
                code: None,
                combination: BTreeSet::new(),
                label: simple.label().to_string(),
                acronym: simple.name().to_string(),
            });
        }

        let generator = CombinationGenerator::new_unchecked(&base_items, id_base);
        entries.extend(generator.iter().map(|combination| ChargeCalculationType {
            id: combination.id,
            kind: CalculationKind::Combination,
            code: Some(combination.code),
            combination: combination.positions,
            label: combination.label,
            acronym: combination.acronym,
        }));

        if let Some(extended) = Self::extension_entry(&base_items, id_base) {
            entries.push(extended);
        }

        let full_width = base_items.full_width();
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_code = HashMap::with_capacity(entries.len());
        for (slot, entry) in entries.iter().enumerate() {
            by_id.insert(entry.id, slot);
            if let Some(code) = &entry.code {
                by_code.insert(code.padded_to(full_width).as_str().to_string(), slot);
            }
        }

        info!(
            width = base_items.width(),
            full_width,
            id_base,
            entries = entries.len(),
            "Calculation type catalog built"
        );

        CalculationTypeCatalog {
            base_items,
            id_base,
            entries,
            by_id,
            by_code,
            invalid: ChargeCalculationType::invalid(),
        }
    }

    /// The flat variant of the extension component, numbered right after
    /// the generated range.
    fn extension_entry(base_items: &BaseItemCatalog, id_base: i32) -> Option<ChargeCalculationType> {
        let extension = base_items.extension()?;
        let full_width = base_items.full_width();

        let mut present: Vec<_> = base_items
            .items()
            .iter()
            .filter(|item| item.kind == BaseItemKind::Flat)
            .collect();
        present.push(extension);

        let combination: BTreeSet<usize> = present.iter().map(|item| item.index).collect();
        let mask = combination
            .iter()
            .fold(0u64, |mask, position| mask | 1 << (full_width - 1 - position));

        Some(ChargeCalculationType {
            id: CalculationTypeId::new(
                id_base + combination_count(base_items.width()) as i32 + 1,
            ),
            kind: CalculationKind::Extended,
            code: Some(Code::from_mask(mask, full_width)),
            combination,
            label: present
                .iter()
                .map(|item| item.full_label.as_str())
                .collect::<Vec<_>>()
                .join("."),
            acronym: present
                .iter()
                .map(|item| item.acronym.as_str())
                .collect::<Vec<_>>()
                .join("_"),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn base_items(&self) -> &BaseItemCatalog {
        &self.base_items
    }

    pub fn id_base(&self) -> i32 {
        self.id_base
    }

    /// Number of entries (sentinel excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending id order (sentinel excluded).
    pub fn iter(&self) -> impl Iterator<Item = &ChargeCalculationType> {
        self.entries.iter()
    }

    /// The `INVALID` sentinel.
    pub fn invalid(&self) -> &ChargeCalculationType {
        &self.invalid
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Finds an entry by numeric id.
    ///
    /// Id 0 is the sentinel and is reported as unknown here.
    pub fn lookup_id(
        &self,
        id: impl Into<CalculationTypeId>,
    ) -> Result<&ChargeCalculationType, LookupMiss> {
        let id = id.into();
        self.by_id
            .get(&id)
            .map(|slot| &self.entries[*slot])
            .ok_or(LookupMiss::UnknownId(id.value()))
    }

    /// Permissive lookup: unknown ids resolve to the `INVALID` sentinel.
    pub fn resolve_id(&self, id: impl Into<CalculationTypeId>) -> &ChargeCalculationType {
        let id = id.into();
        self.lookup_id(id).unwrap_or_else(|miss| {
            debug!(%miss, "Resolving to INVALID calculation type");
            &self.invalid
        })
    }

    /// Finds an entry by code.
    ///
    /// Both the base width and the extended width are accepted; a base-width
    /// code is compared as if a `0` were appended.
    pub fn lookup_code(&self, code: &Code) -> Result<&ChargeCalculationType, LookupMiss> {
        let width = code.width();
        let base = self.base_items.width();
        let full = self.base_items.full_width();

        if width != base && width != full {
            return Err(LookupMiss::WidthMismatch {
                code: code.to_string(),
                width,
                expected: self.accepted_widths(),
            });
        }

        self.by_code
            .get(code.padded_to(full).as_str())
            .map(|slot| &self.entries[*slot])
            .ok_or_else(|| LookupMiss::UnknownCode(code.to_string()))
    }

    /// Parses then looks up a textual code.
    pub fn lookup_code_str(&self, input: &str) -> Result<&ChargeCalculationType, LookupMiss> {
        let code = Code::parse(input)?;
        self.lookup_code(&code)
    }

    fn accepted_widths(&self) -> String {
        let base = self.base_items.width();
        let full = self.base_items.full_width();
        if base == full {
            base.to_string()
        } else {
            format!("{} or {}", base, full)
        }
    }

    // =========================================================================
    // Decode / Encode
    // =========================================================================

    /// Positions present in a code.
    ///
    /// Codes shorter than the full width are read as zero-padded on the
    /// right; longer codes are rejected.
    pub fn decode(&self, code: &Code) -> Result<BTreeSet<usize>, LookupMiss> {
        let full = self.base_items.full_width();
        if code.width() > full {
            return Err(LookupMiss::WidthMismatch {
                code: code.to_string(),
                width: code.width(),
                expected: format!("at most {}", full),
            });
        }
        Ok(code.padded_to(full).positions())
    }

    /// Components present in a code, in digit order.
    pub fn decode_kinds(&self, code: &Code) -> Result<Vec<BaseItemKind>, LookupMiss> {
        Ok(self
            .decode(code)?
            .into_iter()
            .filter_map(|position| self.base_items.item(position).map(|item| item.kind))
            .collect())
    }

    /// Encodes a set of positions.
    ///
    /// The result has the base width unless a position needs the extension
    /// digit.
    pub fn encode(&self, positions: &BTreeSet<usize>) -> Result<Code, LookupMiss> {
        let base = self.base_items.width();
        let width = if positions.iter().all(|position| *position < base) {
            base
        } else {
            self.base_items.full_width()
        };
        Ok(Code::from_positions(positions.iter().copied(), width)?)
    }

    /// Code for a set of components, `None` if one is not in this catalog.
    pub fn code_for(&self, kinds: &[BaseItemKind]) -> Option<Code> {
        let positions = kinds
            .iter()
            .map(|kind| self.base_items.position_of(*kind))
            .collect::<Option<BTreeSet<usize>>>()?;
        self.encode(&positions).ok()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Combinatorial entries whose combination includes every given kind.
    pub fn combinations_containing(&self, kinds: &[BaseItemKind]) -> Vec<&ChargeCalculationType> {
        let Some(required) = kinds
            .iter()
            .map(|kind| self.base_items.position_of(*kind))
            .collect::<Option<BTreeSet<usize>>>()
        else {
            return Vec::new();
        };

        self.entries
            .iter()
            .filter(|entry| entry.is_combinatorial())
            .filter(|entry| required.iter().all(|position| entry.contains(*position)))
            .collect()
    }

    /// True when `entry` is the flat voluntary insurance type.
    ///
    /// Compared by code rather than id: ids move with the configured base
    /// offset, codes do not.
    pub fn is_voluntary_insurance_flat(&self, entry: &ChargeCalculationType) -> bool {
        let (Some(code), Some(expected)) = (
            entry.code.as_ref(),
            self.code_for(&[BaseItemKind::VoluntaryInsurance, BaseItemKind::Flat]),
        ) else {
            return false;
        };
        let full = self.base_items.full_width();
        code.padded_to(full) == expected.padded_to(full)
    }

    /// Snapshot for dropdown consumers (sentinel excluded).
    pub fn export(&self) -> Vec<CatalogExportRow> {
        self.entries.iter().map(CatalogExportRow::from).collect()
    }
}

// =============================================================================
// Standard Catalog
// =============================================================================

static STANDARD: OnceLock<CalculationTypeCatalog> = OnceLock::new();

/// The process-wide catalog over [`BaseItemCatalog::standard`] with
/// [`DEFAULT_COMBINATION_ID_BASE`]. Built on first use.
pub fn standard_catalog() -> &'static CalculationTypeCatalog {
    STANDARD.get_or_init(|| {
        CalculationTypeCatalog::assemble(BaseItemCatalog::standard(), DEFAULT_COMBINATION_ID_BASE)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
