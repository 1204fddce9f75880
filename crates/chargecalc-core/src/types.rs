//! # Domain Types
//!
//! Core domain types shared by the catalog and the validator.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  BaseItemKind   │   │    BaseItem     │   │ CalculationTypeId   │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────      │   │
//! │  │  Flat           │   │  index          │   │  i32 newtype        │   │
//! │  │  Aval           │   │  kind           │   │  0 = INVALID        │   │
//! │  │  Honorarios ... │   │  acronym, label │   │  1..=10 legacy      │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │   ChargeRole    │   │   ChargeTime    │   │ ChargeConfiguration │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────      │   │
//! │  │  Penalty        │   │  InstallmentFee │   │  name, role, time   │   │
//! │  │  Aval ...       │   │  Overdue ...    │   │  declared code      │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::code::Code;
use crate::error::ParseError;

// =============================================================================
// Calculation Type Id
// =============================================================================

/// Numeric identity of a charge calculation type.
///
/// This is the value persisted in the charge's integer column. Ids `1..=10`
/// are the legacy simple types, `0` is the `INVALID` sentinel, and generated
/// combinations start above the configured base offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
#[ts(export)]
pub struct CalculationTypeId(i32);

impl CalculationTypeId {
    /// The `INVALID` sentinel id.
    pub const INVALID: CalculationTypeId = CalculationTypeId(0);

    #[inline]
    pub const fn new(value: i32) -> Self {
        CalculationTypeId(value)
    }

    #[inline]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for CalculationTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for CalculationTypeId {
    fn from(value: i32) -> Self {
        CalculationTypeId(value)
    }
}

// =============================================================================
// Base Item Kind
// =============================================================================

/// A boolean component of a calculation type.
///
/// Roles name the components they account for through this tag; the digit
/// position of each component is looked up in the active
/// [`BaseItemCatalog`](crate::base_item::BaseItemCatalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BaseItemKind {
    Flat,
    DisbursedAmount,
    Interest,
    OutstandingPrincipal,
    PrincipalInstallment,
    InterestInstallment,
    MandatoryInsurance,
    VoluntaryInsurance,
    Aval,
    Honorarios,
    PercentOfAnotherCharge,
}

impl BaseItemKind {
    /// Every kind, in declaration order.
    pub const ALL: [BaseItemKind; 11] = [
        BaseItemKind::Flat,
        BaseItemKind::DisbursedAmount,
        BaseItemKind::Interest,
        BaseItemKind::OutstandingPrincipal,
        BaseItemKind::PrincipalInstallment,
        BaseItemKind::InterestInstallment,
        BaseItemKind::MandatoryInsurance,
        BaseItemKind::VoluntaryInsurance,
        BaseItemKind::Aval,
        BaseItemKind::Honorarios,
        BaseItemKind::PercentOfAnotherCharge,
    ];

    /// Snake-case name used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseItemKind::Flat => "flat",
            BaseItemKind::DisbursedAmount => "disbursed_amount",
            BaseItemKind::Interest => "interest",
            BaseItemKind::OutstandingPrincipal => "outstanding_principal",
            BaseItemKind::PrincipalInstallment => "principal_installment",
            BaseItemKind::InterestInstallment => "interest_installment",
            BaseItemKind::MandatoryInsurance => "mandatory_insurance",
            BaseItemKind::VoluntaryInsurance => "voluntary_insurance",
            BaseItemKind::Aval => "aval",
            BaseItemKind::Honorarios => "honorarios",
            BaseItemKind::PercentOfAnotherCharge => "percent_of_another_charge",
        }
    }

    /// Default short label.
    pub fn default_acronym(&self) -> &'static str {
        match self {
            BaseItemKind::Flat => "FLAT",
            BaseItemKind::DisbursedAmount => "AMT",
            BaseItemKind::Interest => "INT",
            BaseItemKind::OutstandingPrincipal => "OP",
            BaseItemKind::PrincipalInstallment => "PI",
            BaseItemKind::InterestInstallment => "II",
            BaseItemKind::MandatoryInsurance => "MI",
            BaseItemKind::VoluntaryInsurance => "VI",
            BaseItemKind::Aval => "AV",
            BaseItemKind::Honorarios => "HO",
            BaseItemKind::PercentOfAnotherCharge => "PAC",
        }
    }

    /// Default descriptive label.
    pub fn default_label(&self) -> &'static str {
        match self {
            BaseItemKind::Flat => "Flat",
            BaseItemKind::DisbursedAmount => "Disbursed Amount",
            BaseItemKind::Interest => "Interest",
            BaseItemKind::OutstandingPrincipal => "Outstanding Principal",
            BaseItemKind::PrincipalInstallment => "Principal Installment",
            BaseItemKind::InterestInstallment => "Interest Installment",
            BaseItemKind::MandatoryInsurance => "Mandatory Insurance",
            BaseItemKind::VoluntaryInsurance => "Voluntary Insurance",
            BaseItemKind::Aval => "Aval",
            BaseItemKind::Honorarios => "Honorarios",
            BaseItemKind::PercentOfAnotherCharge => "Percent Of Another Charge",
        }
    }
}

impl fmt::Display for BaseItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseItemKind {
    type Err = ParseError;

    /// Accepts the snake-case name or the default acronym.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        BaseItemKind::ALL
            .into_iter()
            .find(|kind| {
                kind.as_str() == normalized || kind.default_acronym().eq_ignore_ascii_case(s.trim())
            })
            .ok_or_else(|| ParseError::NotAllowed {
                field: "base item".to_string(),
                value: s.to_string(),
                allowed: BaseItemKind::ALL.iter().map(|k| k.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Base Item
// =============================================================================

/// One component of the catalog, pinned to a digit position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseItem {
    /// Digit position (0 = leftmost).
    pub index: usize,
    pub kind: BaseItemKind,
    /// Joined with `_` in combination acronyms.
    pub acronym: String,
    /// Joined with `.` in combination labels.
    pub full_label: String,
}

// =============================================================================
// Charge Time
// =============================================================================

/// When a charge is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChargeTime {
    Disbursement,
    SpecifiedDueDate,
    /// Collected with every installment.
    InstallmentFee,
    /// Applied when an installment becomes overdue.
    OverdueInstallment,
    Other,
}

impl ChargeTime {
    const NAMES: [&'static str; 5] = [
        "disbursement",
        "specified_due_date",
        "installment_fee",
        "overdue_installment",
        "other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeTime::Disbursement => "disbursement",
            ChargeTime::SpecifiedDueDate => "specified_due_date",
            ChargeTime::InstallmentFee => "installment_fee",
            ChargeTime::OverdueInstallment => "overdue_installment",
            ChargeTime::Other => "other",
        }
    }
}

impl fmt::Display for ChargeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeTime {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "disbursement" => Ok(ChargeTime::Disbursement),
            "specified_due_date" => Ok(ChargeTime::SpecifiedDueDate),
            "installment_fee" => Ok(ChargeTime::InstallmentFee),
            "overdue_installment" | "overdue" => Ok(ChargeTime::OverdueInstallment),
            "other" => Ok(ChargeTime::Other),
            _ => Err(ParseError::NotAllowed {
                field: "charge time".to_string(),
                value: s.to_string(),
                allowed: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Charge Role
// =============================================================================

/// Functional classification of a charge.
///
/// The role decides which components the declared code may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ChargeRole {
    Penalty,
    MandatoryInsuranceFlat,
    MandatoryInsurancePercent,
    MandatoryInsuranceOutstandingPrincipal,
    VoluntaryInsuranceFlat,
    Aval,
    PercentOfAnotherCharge,
    FlatHonorarios,
    Other,
}

impl ChargeRole {
    const NAMES: [&'static str; 9] = [
        "penalty",
        "mandatory_insurance_flat",
        "mandatory_insurance_percent",
        "mandatory_insurance_outstanding_principal",
        "voluntary_insurance_flat",
        "aval",
        "percent_of_another_charge",
        "flat_honorarios",
        "other",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeRole::Penalty => "penalty",
            ChargeRole::MandatoryInsuranceFlat => "mandatory_insurance_flat",
            ChargeRole::MandatoryInsurancePercent => "mandatory_insurance_percent",
            ChargeRole::MandatoryInsuranceOutstandingPrincipal => {
                "mandatory_insurance_outstanding_principal"
            }
            ChargeRole::VoluntaryInsuranceFlat => "voluntary_insurance_flat",
            ChargeRole::Aval => "aval",
            ChargeRole::PercentOfAnotherCharge => "percent_of_another_charge",
            ChargeRole::FlatHonorarios => "flat_honorarios",
            ChargeRole::Other => "other",
        }
    }

    #[inline]
    pub fn is_penalty(&self) -> bool {
        matches!(self, ChargeRole::Penalty)
    }
}

impl fmt::Display for ChargeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargeRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "penalty" => Ok(ChargeRole::Penalty),
            "mandatory_insurance_flat" => Ok(ChargeRole::MandatoryInsuranceFlat),
            "mandatory_insurance_percent" => Ok(ChargeRole::MandatoryInsurancePercent),
            "mandatory_insurance_outstanding_principal" => {
                Ok(ChargeRole::MandatoryInsuranceOutstandingPrincipal)
            }
            "voluntary_insurance_flat" => Ok(ChargeRole::VoluntaryInsuranceFlat),
            "aval" => Ok(ChargeRole::Aval),
            "percent_of_another_charge" => Ok(ChargeRole::PercentOfAnotherCharge),
            "flat_honorarios" => Ok(ChargeRole::FlatHonorarios),
            "other" => Ok(ChargeRole::Other),
            _ => Err(ParseError::NotAllowed {
                field: "role".to_string(),
                value: s.to_string(),
                allowed: Self::NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Charge Configuration
// =============================================================================

/// The setup of one charge, as handed over by the charge entity at create or
/// update time.
///
/// Transient: built per validation call and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeConfiguration {
    /// Display name, reported back in violations.
    pub name: String,
    pub role: ChargeRole,
    pub charge_time: ChargeTime,
    /// Code of the charge's calculation type.
    pub declared_code: Code,
    /// Penalty charges must reference an interest rate.
    pub interest_rate_linked: bool,
    /// Aval charges must take their percentage from the rate table.
    pub gets_percentage_from_table: bool,
}

impl ChargeConfiguration {
    pub fn new(
        name: impl Into<String>,
        role: ChargeRole,
        charge_time: ChargeTime,
        declared_code: Code,
    ) -> Self {
        ChargeConfiguration {
            name: name.into(),
            role,
            charge_time,
            declared_code,
            interest_rate_linked: false,
            gets_percentage_from_table: false,
        }
    }

    pub fn with_interest_rate_link(mut self) -> Self {
        self.interest_rate_linked = true;
        self
    }

    pub fn with_percentage_from_table(mut self) -> Self {
        self.gets_percentage_from_table = true;
        self
    }

    #[inline]
    pub fn is_penalty(&self) -> bool {
        self.role.is_penalty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
