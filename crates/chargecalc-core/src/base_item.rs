//! # Base Item Catalog
//!
//! The ordered list of boolean components every calculation code is built on.
//!
//! ```text
//! position   0     1    2    3   4   5   6   7   8   9  │  10
//! kind     FLAT  AMT  INT  OP  PI  II  MI  AV  HO  PAC │  VI  (extension)
//!          └──────────── base width N = 10 ────────────┘
//! ```
//!
//! The extension slot exists for voluntary insurance only: it was added after
//! the combinatorial codes were issued, so it never takes part in generation
//! and codes that need it are one digit wider.

use std::collections::HashSet;

use tracing::debug;

use crate::error::CatalogError;
use crate::types::{BaseItem, BaseItemKind};
use crate::MAX_CATALOG_WIDTH;

/// Components of the standard charge catalog, in digit order.
pub const STANDARD_ITEMS: [BaseItemKind; 10] = [
    BaseItemKind::Flat,
    BaseItemKind::DisbursedAmount,
    BaseItemKind::Interest,
    BaseItemKind::OutstandingPrincipal,
    BaseItemKind::PrincipalInstallment,
    BaseItemKind::InterestInstallment,
    BaseItemKind::MandatoryInsurance,
    BaseItemKind::Aval,
    BaseItemKind::Honorarios,
    BaseItemKind::PercentOfAnotherCharge,
];

/// Component occupying the extra digit of the standard catalog.
pub const STANDARD_EXTENSION: BaseItemKind = BaseItemKind::VoluntaryInsurance;

/// Base width of the standard catalog.
pub const STANDARD_WIDTH: usize = STANDARD_ITEMS.len();

// =============================================================================
// Item Definition
// =============================================================================

/// Input for one catalog slot; the index is assigned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseItemDef {
    pub kind: BaseItemKind,
    pub acronym: String,
    pub full_label: String,
}

impl BaseItemDef {
    pub fn new(
        kind: BaseItemKind,
        acronym: impl Into<String>,
        full_label: impl Into<String>,
    ) -> Self {
        BaseItemDef {
            kind,
            acronym: acronym.into(),
            full_label: full_label.into(),
        }
    }
}

impl From<BaseItemKind> for BaseItemDef {
    /// Uses the kind's default acronym and label.
    fn from(kind: BaseItemKind) -> Self {
        BaseItemDef::new(kind, kind.default_acronym(), kind.default_label())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Immutable, ordered set of base items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseItemCatalog {
    items: Vec<BaseItem>,
    extension: Option<BaseItem>,
}

impl BaseItemCatalog {
    /// Builds a catalog from item definitions in digit order.
    ///
    /// ## Rules
    /// - At least one item (width 0 cannot produce codes)
    /// - At most [`MAX_CATALOG_WIDTH`] items
    /// - Every kind at most once
    /// - Non-empty acronym and label
    ///
    /// ## Example
    /// ```rust
    /// use chargecalc_core::base_item::BaseItemCatalog;
    /// use chargecalc_core::BaseItemKind;
    ///
    /// let catalog = BaseItemCatalog::new([BaseItemKind::Aval, BaseItemKind::Honorarios]).unwrap();
    /// assert_eq!(catalog.width(), 2);
    /// assert_eq!(catalog.position_of(BaseItemKind::Honorarios), Some(1));
    ///
    /// let empty: [BaseItemKind; 0] = [];
    /// assert!(BaseItemCatalog::new(empty).is_err());
    /// ```
    pub fn new<I, D>(items: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = D>,
        D: Into<BaseItemDef>,
    {
        let defs: Vec<BaseItemDef> = items.into_iter().map(Into::into).collect();

        if defs.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        if defs.len() > MAX_CATALOG_WIDTH {
            return Err(CatalogError::TooWide {
                width: defs.len(),
                max: MAX_CATALOG_WIDTH,
            });
        }

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(defs.len());
        for (index, def) in defs.into_iter().enumerate() {
            items.push(Self::checked_item(index, def, &mut seen)?);
        }

        debug!(width = items.len(), "Base item catalog built");
        Ok(BaseItemCatalog {
            items,
            extension: None,
        })
    }

    /// Adds the extra digit that follows the base width.
    pub fn with_extension(mut self, def: impl Into<BaseItemDef>) -> Result<Self, CatalogError> {
        let mut seen: HashSet<BaseItemKind> = self.items.iter().map(|item| item.kind).collect();
        let item = Self::checked_item(self.items.len(), def.into(), &mut seen)?;
        self.extension = Some(item);
        Ok(self)
    }

    fn checked_item(
        index: usize,
        def: BaseItemDef,
        seen: &mut HashSet<BaseItemKind>,
    ) -> Result<BaseItem, CatalogError> {
        if def.acronym.trim().is_empty() {
            return Err(CatalogError::EmptyLabel {
                index,
                field: "acronym",
            });
        }
        if def.full_label.trim().is_empty() {
            return Err(CatalogError::EmptyLabel {
                index,
                field: "label",
            });
        }
        if !seen.insert(def.kind) {
            return Err(CatalogError::DuplicateKind { kind: def.kind });
        }

        Ok(BaseItem {
            index,
            kind: def.kind,
            acronym: def.acronym,
            full_label: def.full_label,
        })
    }

    /// The standard charge catalog: ten base items plus the voluntary
    /// insurance extension digit.
    pub fn standard() -> Self {
        let items = STANDARD_ITEMS
            .iter()
            .enumerate()
            .map(|(index, kind)| BaseItem {
                index,
                kind: *kind,
                acronym: kind.default_acronym().to_string(),
                full_label: kind.default_label().to_string(),
            })
            .collect();

        BaseItemCatalog {
            items,
            extension: Some(BaseItem {
                index: STANDARD_WIDTH,
                kind: STANDARD_EXTENSION,
                acronym: STANDARD_EXTENSION.default_acronym().to_string(),
                full_label: STANDARD_EXTENSION.default_label().to_string(),
            }),
        }
    }

    /// Number of items taking part in combination generation (N).
    #[inline]
    pub fn width(&self) -> usize {
        self.items.len()
    }

    /// N, plus one when an extension digit is present.
    #[inline]
    pub fn full_width(&self) -> usize {
        self.items.len() + usize::from(self.extension.is_some())
    }

    /// Base items in digit order (extension excluded).
    pub fn items(&self) -> &[BaseItem] {
        &self.items
    }

    pub fn extension(&self) -> Option<&BaseItem> {
        self.extension.as_ref()
    }

    /// Base items followed by the extension, if any.
    pub fn iter_all(&self) -> impl Iterator<Item = &BaseItem> {
        self.items.iter().chain(self.extension.iter())
    }

    /// Item at a digit position, extension included.
    pub fn item(&self, index: usize) -> Option<&BaseItem> {
        self.iter_all().find(|item| item.index == index)
    }

    /// Digit position of a component, if this catalog carries it.
    pub fn position_of(&self, kind: BaseItemKind) -> Option<usize> {
        self.iter_all()
            .find(|item| item.kind == kind)
            .map(|item| item.index)
    }

    /// True when `index` is the extension digit.
    pub fn is_extension_position(&self, index: usize) -> bool {
        self.extension
            .as_ref()
            .map(|item| item.index == index)
            .unwrap_or(false)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
