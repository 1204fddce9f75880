//! # chargecalc-core: Charge Calculation Type Codec
//!
//! Pure classification logic for charge calculation types. No I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Charge Classification Flow                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Charge entity (persistence / transport)            │   │
//! │  │        create charge ──► update charge ──► list types           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ChargeConfiguration                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ chargecalc-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ base_item │─►│ generator │─►│  catalog  │◄─│validation │  │   │
//! │  │   │  N items  │  │ 2^N - 1   │  │ id ⇄ code │  │ residual  │  │   │
//! │  │   │  ordered  │  │  subsets  │  │  ⇄ label  │  │ bit check │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • BUILT ONCE • READ-ONLY AFTER CONSTRUCTION            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`base_item`] - Ordered catalog of boolean components
//! - [`code`] - Positional digit code
//! - [`generator`] - Enumerates every non-empty subset
//! - [`catalog`] - Registry of calculation types
//! - [`validation`] - Charge configuration checks
//! - [`types`] - Shared domain types
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chargecalc_core::catalog::standard_catalog;
//! use chargecalc_core::validation::ConfigurationValidator;
//! use chargecalc_core::{ChargeConfiguration, ChargeRole, ChargeTime};
//!
//! let catalog = standard_catalog();
//! let entry = catalog.lookup_code_str("1000000010").unwrap();
//! assert_eq!(entry.label, "Flat.Honorarios");
//!
//! let config = ChargeConfiguration::new(
//!     "Honorarios",
//!     ChargeRole::FlatHonorarios,
//!     ChargeTime::InstallmentFee,
//!     entry.code.clone().unwrap(),
//! );
//! assert!(ConfigurationValidator::standard().verify(&config).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod base_item;
pub mod catalog;
pub mod code;
pub mod error;
pub mod generator;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use base_item::BaseItemCatalog;
pub use catalog::{standard_catalog, CalculationTypeCatalog, ChargeCalculationType};
pub use code::Code;
pub use error::{
    CatalogError, ChargeError, CodeError, CoreError, CoreResult, LookupMiss, ViolationReason,
};
pub use types::*;
pub use validation::ConfigurationValidator;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Id offset for generated combinations: the first combination gets
/// `DEFAULT_COMBINATION_ID_BASE + 1`.
///
/// Ids `0..=10` belong to the `INVALID` sentinel and the legacy simple types,
/// so the base must stay at or above 10.
pub const DEFAULT_COMBINATION_ID_BASE: i32 = 100;

/// Maximum number of base items in a catalog.
pub const MAX_CATALOG_WIDTH: usize = 16;

/// Maximum code width: every base item plus one extension digit.
pub const MAX_CODE_WIDTH: usize = MAX_CATALOG_WIDTH + 1;
