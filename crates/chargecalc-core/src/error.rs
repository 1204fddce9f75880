//! # Error Types
//!
//! Domain-specific error types for chargecalc-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  CatalogError     - base item catalog is empty or malformed (startup)   │
//! │  CodeError        - a digit string is not a well-formed code            │
//! │  LookupMiss       - unknown calculation type id or code                 │
//! │  ChargeError      - charge is not set up correctly (validation)         │
//! │  ParseError       - unknown textual value for a role / charge time      │
//! │                                                                         │
//! │  CoreError wraps all of them for callers that want a single type.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (charge name, id, code)
//! 3. Errors are enum variants, never String
//! 4. A charge violation always carries the stable error code
//!    [`CHARGE_NOT_SETUP_CORRECTLY`] and the charge's display name

use std::fmt;

use thiserror::Error;

use crate::types::{BaseItemKind, ChargeTime};

/// Stable error code reported for every rejected charge configuration.
pub const CHARGE_NOT_SETUP_CORRECTLY: &str = "charge.not.setup.correctly";

// =============================================================================
// Catalog Error
// =============================================================================

/// Errors raised while building the base item or calculation type catalogs.
///
/// These are fatal at startup: a catalog that fails to build can never be
/// used to classify charges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No base items were supplied (code width 0).
    #[error("Base item catalog is empty")]
    EmptyCatalog,

    /// More base items than a code can hold.
    #[error("Base item catalog width {width} exceeds maximum of {max}")]
    TooWide { width: usize, max: usize },

    /// The same component appears twice.
    #[error("Base item {kind} appears more than once")]
    DuplicateKind { kind: BaseItemKind },

    /// An item has an empty acronym or label.
    #[error("Base item at index {index} has an empty {field}")]
    EmptyLabel { index: usize, field: &'static str },

    /// The combination id base collides with the reserved legacy ids.
    #[error("Combination id base {base} overlaps reserved ids 0..={reserved_max}")]
    IdBaseCollision { base: i32, reserved_max: i32 },

    /// The generated id range does not fit an `i32`.
    #[error("Combination id base {base} cannot hold {count} combinations")]
    IdRangeOverflow { base: i32, count: u64 },
}

// =============================================================================
// Code Error
// =============================================================================

/// A digit string could not be interpreted as a calculation code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    /// Empty input.
    #[error("Code is empty")]
    Empty,

    /// A character other than `0` or `1`.
    #[error("Code has invalid digit '{found}' at position {position}")]
    InvalidDigit { position: usize, found: char },

    /// Longer than any catalog can produce.
    #[error("Code width {width} exceeds maximum of {max}")]
    TooWide { width: usize, max: usize },

    /// A stored integer has more digits than the requested width.
    #[error("Stored code {value} does not fit width {width}")]
    StoredOverflow { value: i64, width: usize },

    /// Stored integers are never negative.
    #[error("Stored code {0} is negative")]
    NegativeStored(i64),

    /// A position outside the code width was requested.
    #[error("Position {position} is outside code width {width}")]
    PositionOutOfRange { position: usize, width: usize },
}

// =============================================================================
// Lookup Miss
// =============================================================================

/// The catalog has no entry for the requested id or code.
///
/// Callers that prefer the permissive behaviour use
/// [`CalculationTypeCatalog::resolve_id`](crate::catalog::CalculationTypeCatalog::resolve_id),
/// which maps a miss to the explicit `INVALID` sentinel instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupMiss {
    /// No entry has this numeric id.
    #[error("Unknown calculation type id: {0}")]
    UnknownId(i32),

    /// Well-formed code that no entry carries.
    #[error("Unknown calculation type code: {0}")]
    UnknownCode(String),

    /// Code width not accepted by this catalog.
    #[error("Code '{code}' has width {width}, expected {expected}")]
    WidthMismatch {
        code: String,
        width: usize,
        expected: String,
    },

    /// Input was not a code at all.
    #[error("Malformed calculation type code: {0}")]
    Malformed(#[from] CodeError),
}

// =============================================================================
// Charge Error
// =============================================================================

/// Why a charge configuration was rejected.
///
/// The public error code is the same for every reason; the reason exists for
/// logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// Non-penalty charge that is not collected as an installment fee.
    ChargeTimeNotAllowed { time: ChargeTime },
    /// Penalty that is not applied on overdue installments.
    PenaltyNotOverdue { time: ChargeTime },
    /// Penalty without a linked interest rate.
    MissingInterestRateLink,
    /// Aval charge that does not take its percentage from the rate table.
    PercentageTableRequired,
    /// Role with no accepted component pattern.
    UnsupportedRole,
    /// Bits left set after clearing the expected components.
    ResidualBits { positions: Vec<usize> },
    /// Declared code width does not match the catalog.
    CodeWidthMismatch { width: usize, expected: usize },
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::ChargeTimeNotAllowed { time } => {
                write!(f, "charge time {} is not allowed for this role", time)
            }
            ViolationReason::PenaltyNotOverdue { time } => {
                write!(f, "penalty must be charged on overdue installments, got {}", time)
            }
            ViolationReason::MissingInterestRateLink => {
                write!(f, "penalty has no linked interest rate")
            }
            ViolationReason::PercentageTableRequired => {
                write!(f, "aval charge must take its percentage from the table")
            }
            ViolationReason::UnsupportedRole => write!(f, "role has no accepted pattern"),
            ViolationReason::ResidualBits { positions } => {
                write!(f, "unexpected components at positions {:?}", positions)
            }
            ViolationReason::CodeWidthMismatch { width, expected } => {
                write!(f, "code width {} does not match expected width {}", width, expected)
            }
        }
    }
}

/// Charge configuration violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChargeError {
    /// The charge's calculation type does not fit its role.
    ///
    /// ## When This Occurs
    /// ```text
    /// create/update charge
    ///      │
    ///      ▼
    /// ConfigurationValidator::verify
    ///      │
    ///      ├── role precondition fails ──► NotSetupCorrectly
    ///      │
    ///      └── residual bit left set ───► NotSetupCorrectly
    /// ```
    #[error("Charge '{charge_name}' is not set up correctly: {reason}")]
    NotSetupCorrectly {
        charge_name: String,
        reason: ViolationReason,
    },
}

impl ChargeError {
    /// Creates a violation for the named charge.
    pub fn not_setup_correctly(charge_name: impl Into<String>, reason: ViolationReason) -> Self {
        ChargeError::NotSetupCorrectly {
            charge_name: charge_name.into(),
            reason,
        }
    }

    /// Stable error code for the transport layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChargeError::NotSetupCorrectly { .. } => CHARGE_NOT_SETUP_CORRECTLY,
        }
    }

    /// Display name of the rejected charge.
    pub fn charge_name(&self) -> &str {
        match self {
            ChargeError::NotSetupCorrectly { charge_name, .. } => charge_name,
        }
    }

    /// Why the charge was rejected.
    pub fn reason(&self) -> &ViolationReason {
        match self {
            ChargeError::NotSetupCorrectly { reason, .. } => reason,
        }
    }
}

// =============================================================================
// Parse Error
// =============================================================================

/// Textual input did not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Value is not in allowed set.
    #[error("{field} '{value}' must be one of: {allowed:?}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella error for callers that handle every failure the same way.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    Lookup(#[from] LookupMiss),

    #[error(transparent)]
    Charge(#[from] ChargeError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_error_carries_code_and_name() {
        let err = ChargeError::not_setup_correctly(
            "Seguro Vida",
            ViolationReason::ResidualBits { positions: vec![8] },
        );
        assert_eq!(err.error_code(), "charge.not.setup.correctly");
        assert_eq!(err.charge_name(), "Seguro Vida");
        assert_eq!(
            err.to_string(),
            "Charge 'Seguro Vida' is not set up correctly: unexpected components at positions [8]"
        );
    }

    #[test]
    fn test_catalog_error_messages() {
        assert_eq!(CatalogError::EmptyCatalog.to_string(), "Base item catalog is empty");

        let err = CatalogError::DuplicateKind {
            kind: BaseItemKind::Aval,
        };
        assert_eq!(err.to_string(), "Base item aval appears more than once");
    }

    #[test]
    fn test_code_error_converts_to_lookup_miss() {
        let miss: LookupMiss = CodeError::Empty.into();
        assert!(matches!(miss, LookupMiss::Malformed(CodeError::Empty)));
    }

    #[test]
    fn test_errors_convert_to_core_error() {
        let core: CoreError = ChargeError::not_setup_correctly(
            "Aval",
            ViolationReason::PercentageTableRequired,
        )
        .into();
        assert!(matches!(core, CoreError::Charge(_)));

        let core: CoreError = LookupMiss::UnknownId(9999).into();
        assert_eq!(core.to_string(), "Unknown calculation type id: 9999");
    }
}
