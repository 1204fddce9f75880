//! # Validation Module
//!
//! Decides whether a charge's declared calculation code fits its role.
//!
//! ## Residual-Bit Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  declared code     1 0 0 0 0 0 1 0 1 0        (FLAT, MI, HO)            │
//! │  role              MandatoryInsuranceFlat                               │
//! │  expected          FLAT, MI  → positions 0, 6                           │
//! │                                                                         │
//! │  clear expected    0 0 0 0 0 0 0 0 1 0                                  │
//! │                                    ▲                                    │
//! │                    residual '1' at position 8 → charge.not.setup        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Role Dispatch
//! ```text
//! ConfigurationValidator::verify
//!      │
//!      ├── not penalty and not installment fee? ──► violation
//!      │
//!      ├── Penalty ── not overdue / no interest rate? ──► violation
//!      │              PAC bit set? → {PAC}
//!      │              otherwise    → {MI, VI, AV, II, PI}
//!      │
//!      ├── Aval ───── percentage not from table? ──► violation
//!      │              → {AV, AMT}
//!      │
//!      ├── Other ──────────────────────────────────► violation
//!      │
//!      └── remaining roles → fixed component pairs
//!                │
//!                ▼
//!          residual-bit check
//! ```
//!
//! ## Usage
//! ```rust
//! use chargecalc_core::validation::ConfigurationValidator;
//! use chargecalc_core::{ChargeConfiguration, ChargeRole, ChargeTime, Code};
//!
//! let validator = ConfigurationValidator::standard();
//! let code: Code = "1000001000".parse().unwrap(); // FLAT + MI
//! let config = ChargeConfiguration::new(
//!     "Seguro Obligatorio",
//!     ChargeRole::MandatoryInsuranceFlat,
//!     ChargeTime::InstallmentFee,
//!     code,
//! );
//! assert!(validator.verify(&config).is_ok());
//! ```

use tracing::debug;

use crate::base_item::BaseItemCatalog;
use crate::catalog::standard_catalog;
use crate::code::Code;
use crate::error::{ChargeError, ViolationReason};
use crate::types::{BaseItemKind, ChargeConfiguration, ChargeRole, ChargeTime};

/// Most components a role can account for.
pub const MAX_EXPECTED_SLOTS: usize = 5;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ChargeError>;

/// Digit positions a role may clear; `None` slots are skipped.
pub type ExpectedSlots = [Option<usize>; MAX_EXPECTED_SLOTS];

// =============================================================================
// Role Components
// =============================================================================

/// Components a penalty may carry.
pub const PENALTY_COMPONENTS: &[BaseItemKind] = &[
    BaseItemKind::MandatoryInsurance,
    BaseItemKind::VoluntaryInsurance,
    BaseItemKind::Aval,
    BaseItemKind::InterestInstallment,
    BaseItemKind::PrincipalInstallment,
];

/// Components of a percentage-of-another-charge type.
pub const PERCENT_OF_ANOTHER_CHARGE_COMPONENTS: &[BaseItemKind] =
    &[BaseItemKind::PercentOfAnotherCharge];

/// Components accounted for by a non-penalty role.
///
/// `None` means the role has no accepted pattern.
pub fn role_components(role: ChargeRole) -> Option<&'static [BaseItemKind]> {
    match role {
        ChargeRole::Penalty => Some(PENALTY_COMPONENTS),
        ChargeRole::MandatoryInsuranceFlat => {
            Some(&[BaseItemKind::MandatoryInsurance, BaseItemKind::Flat])
        }
        ChargeRole::MandatoryInsurancePercent => Some(&[
            BaseItemKind::MandatoryInsurance,
            BaseItemKind::DisbursedAmount,
        ]),
        ChargeRole::MandatoryInsuranceOutstandingPrincipal => Some(&[
            BaseItemKind::MandatoryInsurance,
            BaseItemKind::OutstandingPrincipal,
        ]),
        ChargeRole::VoluntaryInsuranceFlat => {
            Some(&[BaseItemKind::VoluntaryInsurance, BaseItemKind::Flat])
        }
        ChargeRole::Aval => Some(&[BaseItemKind::Aval, BaseItemKind::DisbursedAmount]),
        ChargeRole::PercentOfAnotherCharge => Some(PERCENT_OF_ANOTHER_CHARGE_COMPONENTS),
        ChargeRole::FlatHonorarios => Some(&[BaseItemKind::Flat, BaseItemKind::Honorarios]),
        ChargeRole::Other => None,
    }
}

// =============================================================================
// Residual-Bit Check
// =============================================================================

/// Positions still set after clearing `expected` from `code`.
///
/// ## Steps
/// 1. A base-width code is padded with one `0` when an expected position
///    lies on the extension digit
/// 2. Every expected position is cleared (`None` slots are skipped)
/// 3. Whatever is still `1` is returned
///
/// Codes whose width is neither the base width nor the full width, or that
/// are too short for an expected position, are rejected.
pub fn residual_positions(
    code: &Code,
    expected: &[Option<usize>],
    items: &BaseItemCatalog,
) -> Result<Vec<usize>, ViolationReason> {
    let base = items.width();
    let full = items.full_width();
    let needs_extension = expected.iter().flatten().any(|position| *position >= base);

    let mut digits: Vec<u8> = code.as_str().bytes().collect();
    if needs_extension && digits.len() == base {
        digits.push(b'0');
    }

    let required = if needs_extension { full } else { base };
    let width_ok = digits.len() == required || digits.len() == full;
    if !width_ok || expected.iter().flatten().any(|position| *position >= digits.len()) {
        return Err(ViolationReason::CodeWidthMismatch {
            width: code.width(),
            expected: required,
        });
    }

    for position in expected.iter().flatten() {
        digits[*position] = b'0';
    }

    Ok(digits
        .iter()
        .enumerate()
        .filter(|(_, digit)| **digit == b'1')
        .map(|(position, _)| position)
        .collect())
}

/// Rejects `code` when it carries a component outside `expected`.
///
/// ## Example
/// ```rust
/// use chargecalc_core::base_item::BaseItemCatalog;
/// use chargecalc_core::validation::verify_charge_configuration;
/// use chargecalc_core::{BaseItemKind, Code};
///
/// let items = BaseItemCatalog::new([
///     BaseItemKind::MandatoryInsurance,
///     BaseItemKind::Honorarios,
/// ])
/// .unwrap();
///
/// let insurance: Code = "10".parse().unwrap();
/// let both: Code = "11".parse().unwrap();
/// let expected = [Some(0), None];
///
/// assert!(verify_charge_configuration("Seguro", &insurance, &expected, &items).is_ok());
/// assert!(verify_charge_configuration("Seguro", &both, &expected, &items).is_err());
/// ```
pub fn verify_charge_configuration(
    charge_name: &str,
    code: &Code,
    expected: &[Option<usize>],
    items: &BaseItemCatalog,
) -> ValidationResult<()> {
    let residual = residual_positions(code, expected, items)
        .map_err(|reason| reject(charge_name, reason))?;

    if !residual.is_empty() {
        return Err(reject(
            charge_name,
            ViolationReason::ResidualBits {
                positions: residual,
            },
        ));
    }

    Ok(())
}

fn reject(charge_name: &str, reason: ViolationReason) -> ChargeError {
    debug!(charge = %charge_name, %reason, "Charge configuration rejected");
    ChargeError::not_setup_correctly(charge_name, reason)
}

// =============================================================================
// Configuration Validator
// =============================================================================

/// Checks charge configurations against a base item catalog.
///
/// Holds only a shared reference, so one validator can serve any number of
/// threads.
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationValidator<'a> {
    items: &'a BaseItemCatalog,
}

impl<'a> ConfigurationValidator<'a> {
    pub fn new(items: &'a BaseItemCatalog) -> Self {
        ConfigurationValidator { items }
    }

    /// Expected slots for a list of components; components this catalog
    /// does not carry become `None`.
    pub fn slots_for(&self, kinds: &[BaseItemKind]) -> ExpectedSlots {
        let mut slots = [None; MAX_EXPECTED_SLOTS];
        for (slot, kind) in slots.iter_mut().zip(kinds) {
            *slot = self.items.position_of(*kind);
        }
        slots
    }

    /// Whether `code` carries the percentage-of-another-charge component.
    fn is_percent_of_another_charge(&self, code: &Code) -> bool {
        self.items
            .position_of(BaseItemKind::PercentOfAnotherCharge)
            .map(|position| code.is_set(position))
            .unwrap_or(false)
    }

    /// Verifies one charge.
    ///
    /// Every failure is a [`ChargeError::NotSetupCorrectly`] naming the
    /// charge; there is no warning state.
    pub fn verify(&self, config: &ChargeConfiguration) -> ValidationResult<()> {
        let name = config.name.as_str();

        if !config.is_penalty() && config.charge_time != ChargeTime::InstallmentFee {
            return Err(reject(
                name,
                ViolationReason::ChargeTimeNotAllowed {
                    time: config.charge_time,
                },
            ));
        }

        let components = match config.role {
            ChargeRole::Penalty => {
                if config.charge_time != ChargeTime::OverdueInstallment {
                    return Err(reject(
                        name,
                        ViolationReason::PenaltyNotOverdue {
                            time: config.charge_time,
                        },
                    ));
                }
                if !config.interest_rate_linked {
                    return Err(reject(name, ViolationReason::MissingInterestRateLink));
                }
                if self.is_percent_of_another_charge(&config.declared_code) {
                    PERCENT_OF_ANOTHER_CHARGE_COMPONENTS
                } else {
                    PENALTY_COMPONENTS
                }
            }
            ChargeRole::Aval if !config.gets_percentage_from_table => {
                return Err(reject(name, ViolationReason::PercentageTableRequired));
            }
            role => match role_components(role) {
                Some(components) => components,
                None => return Err(reject(name, ViolationReason::UnsupportedRole)),
            },
        };

        let expected = self.slots_for(components);
        verify_charge_configuration(name, &config.declared_code, &expected, self.items)
    }
}

impl ConfigurationValidator<'static> {
    /// Validator over the process-wide standard catalog.
    pub fn standard() -> Self {
        ConfigurationValidator::new(standard_catalog().base_items())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn code(digits: &str) -> Code {
        digits.parse().unwrap()
    }

    fn installment_fee(role: ChargeRole, digits: &str) -> ChargeConfiguration {
        ChargeConfiguration::new("Cargo", role, ChargeTime::InstallmentFee, code(digits))
    }

    fn penalty(digits: &str) -> ChargeConfiguration {
        ChargeConfiguration::new(
            "Mora",
            ChargeRole::Penalty,
            ChargeTime::OverdueInstallment,
            code(digits),
        )
        .with_interest_rate_link()
    }

    fn reason_of(result: ValidationResult<()>) -> ViolationReason {
        result.unwrap_err().reason().clone()
    }

    #[test]
    fn test_mandatory_insurance_variants() {
        let validator = ConfigurationValidator::standard();
        // FLAT + MI
        assert!(validator
            .verify(&installment_fee(ChargeRole::MandatoryInsuranceFlat, "1000001000"))
            .is_ok());
        // AMT + MI
        assert!(validator
            .verify(&installment_fee(ChargeRole::MandatoryInsurancePercent, "0100001000"))
            .is_ok());
        // OP + MI
        assert!(validator
            .verify(&installment_fee(
                ChargeRole::MandatoryInsuranceOutstandingPrincipal,
                "0001001000"
            ))
            .is_ok());
        // AMT + MI declared as flat
        assert_eq!(
            reason_of(validator.verify(&installment_fee(
                ChargeRole::MandatoryInsuranceFlat,
                "0100001000"
            ))),
            ViolationReason::ResidualBits { positions: vec![1] }
        );
    }

    #[test]
    fn test_residual_honorarios_rejected() {
        let validator = ConfigurationValidator::standard();
        // FLAT + MI + HO
        let err = validator
            .verify(&installment_fee(ChargeRole::MandatoryInsuranceFlat, "1000001010"))
            .unwrap_err();
        assert_eq!(err.error_code(), "charge.not.setup.correctly");
        assert_eq!(err.charge_name(), "Cargo");
        assert_eq!(
            err.reason(),
            &ViolationReason::ResidualBits { positions: vec![8] }
        );
    }

    #[test]
    fn test_flat_honorarios_and_percent_of_another_charge() {
        let validator = ConfigurationValidator::standard();
        assert!(validator
            .verify(&installment_fee(ChargeRole::FlatHonorarios, "1000000010"))
            .is_ok());
        assert!(validator
            .verify(&installment_fee(ChargeRole::PercentOfAnotherCharge, "0000000001"))
            .is_ok());
        assert!(validator
            .verify(&installment_fee(ChargeRole::PercentOfAnotherCharge, "1000000001"))
            .is_err());
    }

    #[test]
    fn test_voluntary_insurance_accepts_both_widths() {
        let validator = ConfigurationValidator::standard();
        assert!(validator
            .verify(&installment_fee(ChargeRole::VoluntaryInsuranceFlat, "10000000001"))
            .is_ok());
        // Base-width code gets the extra '0'
        assert!(validator
            .verify(&installment_fee(ChargeRole::VoluntaryInsuranceFlat, "1000000000"))
            .is_ok());
        assert!(validator
            .verify(&installment_fee(ChargeRole::VoluntaryInsuranceFlat, "1000001000"))
            .is_err());
    }

    #[test]
    fn test_aval_requires_percentage_table() {
        let validator = ConfigurationValidator::standard();
        let config = installment_fee(ChargeRole::Aval, "0100000100");
        assert_eq!(
            reason_of(validator.verify(&config)),
            ViolationReason::PercentageTableRequired
        );
        assert!(validator
            .verify(&config.with_percentage_from_table())
            .is_ok());
    }

    #[test]
    fn test_non_installment_fee_rejected() {
        let validator = ConfigurationValidator::standard();
        let config = ChargeConfiguration::new(
            "Desembolso",
            ChargeRole::MandatoryInsuranceFlat,
            ChargeTime::Disbursement,
            code("1000001000"),
        );
        assert_eq!(
            reason_of(validator.verify(&config)),
            ViolationReason::ChargeTimeNotAllowed {
                time: ChargeTime::Disbursement
            }
        );
    }

    #[test]
    fn test_other_role_always_rejected() {
        let validator = ConfigurationValidator::standard();
        assert_eq!(
            reason_of(validator.verify(&installment_fee(ChargeRole::Other, "1000000000"))),
            ViolationReason::UnsupportedRole
        );
    }

    #[test]
    fn test_penalty_components() {
        let validator = ConfigurationValidator::standard();
        // PI + II + MI + AV
        assert!(validator.verify(&penalty("0000111100")).is_ok());
        // With the voluntary insurance digit
        assert!(validator.verify(&penalty("00001111001")).is_ok());
        // FLAT is not a penalty component
        assert_eq!(
            reason_of(validator.verify(&penalty("1000100000"))),
            ViolationReason::ResidualBits { positions: vec![0] }
        );
    }

    #[test]
    fn test_penalty_percent_of_another_charge() {
        let validator = ConfigurationValidator::standard();
        assert!(validator.verify(&penalty("0000000001")).is_ok());
        // PAC switches the expected set, so MI is now residual
        assert_eq!(
            reason_of(validator.verify(&penalty("0000001001"))),
            ViolationReason::ResidualBits { positions: vec![6] }
        );
    }

    #[test]
    fn test_penalty_preconditions() {
        let validator = ConfigurationValidator::standard();

        let mut config = penalty("0000001000");
        config.charge_time = ChargeTime::InstallmentFee;
        assert_eq!(
            reason_of(validator.verify(&config)),
            ViolationReason::PenaltyNotOverdue {
                time: ChargeTime::InstallmentFee
            }
        );

        let mut config = penalty("0000001000");
        config.interest_rate_linked = false;
        assert_eq!(
            reason_of(validator.verify(&config)),
            ViolationReason::MissingInterestRateLink
        );
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let validator = ConfigurationValidator::standard();
        assert!(matches!(
            reason_of(validator.verify(&installment_fee(ChargeRole::FlatHonorarios, "10010"))),
            ViolationReason::CodeWidthMismatch { width: 5, expected: 10 }
        ));
        assert!(matches!(
            reason_of(validator.verify(&installment_fee(
                ChargeRole::FlatHonorarios,
                "100000000100"
            ))),
            ViolationReason::CodeWidthMismatch { .. }
        ));
    }

    #[test]
    fn test_slots_skip_missing_kinds() {
        let items = BaseItemCatalog::new([BaseItemKind::Aval, BaseItemKind::Honorarios]).unwrap();
        let validator = ConfigurationValidator::new(&items);
        let slots = validator.slots_for(&[BaseItemKind::Flat, BaseItemKind::Honorarios]);
        assert_eq!(slots, [None, Some(1), None, None, None]);
    }

    #[test]
    fn test_residual_positions_with_null_slots() {
        let items = BaseItemCatalog::standard();
        let residual =
            residual_positions(&code("1000001010"), &[Some(0), None, Some(6)], &items).unwrap();
        assert_eq!(residual, vec![8]);
    }
}
