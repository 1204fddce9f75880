//! Exhaustive checks of the codec over real catalogs.
//!
//! Catalogs are small enough (at most 2^10 subsets) that every property is
//! checked for every combination rather than sampled.

use std::collections::{BTreeSet, HashSet};

use chargecalc_core::base_item::BaseItemCatalog;
use chargecalc_core::catalog::CalculationKind;
use chargecalc_core::generator::CombinationGenerator;
use chargecalc_core::validation::{residual_positions, verify_charge_configuration};
use chargecalc_core::{
    standard_catalog, BaseItemKind, CalculationTypeCatalog, ChargeConfiguration, ChargeRole,
    ChargeTime, Code, ConfigurationValidator, ViolationReason,
};

/// AMOUNT, INTEREST, OUTSTANDING_AMOUNT, AVAL, INSURANCE, HONORARIOS
fn six_items() -> BaseItemCatalog {
    BaseItemCatalog::new([
        BaseItemKind::DisbursedAmount,
        BaseItemKind::Interest,
        BaseItemKind::OutstandingPrincipal,
        BaseItemKind::Aval,
        BaseItemKind::MandatoryInsurance,
        BaseItemKind::Honorarios,
    ])
    .unwrap()
}

fn subsets(width: usize) -> impl Iterator<Item = BTreeSet<usize>> {
    (1u64..(1u64 << width)).map(move |mask| {
        (0..width)
            .filter(|position| mask & (1 << (width - 1 - position)) != 0)
            .collect()
    })
}

// =============================================================================
// Generator Properties
// =============================================================================

#[test]
fn test_six_item_catalog_yields_63_unique_increasing_combinations() {
    let items = six_items();
    let generator = CombinationGenerator::new(&items, 100).unwrap();
    let combinations: Vec<_> = generator.iter().collect();

    assert_eq!(combinations.len(), 63);

    let codes: HashSet<String> = combinations.iter().map(|c| c.code.to_string()).collect();
    assert_eq!(codes.len(), 63);

    assert!(combinations
        .windows(2)
        .all(|pair| pair[0].id < pair[1].id));
    assert!(combinations.iter().all(|c| c.code.width() == 6));
}

#[test]
fn test_round_trip_every_subset_of_standard_catalog() {
    let catalog = standard_catalog();
    let width = catalog.base_items().width();

    for subset in subsets(width) {
        let code = catalog.encode(&subset).unwrap();
        assert_eq!(catalog.decode(&code).unwrap(), subset);

        let entry = catalog.lookup_code(&code).unwrap();
        assert_eq!(entry.combination, subset);
        assert_eq!(entry.kind, CalculationKind::Combination);
    }
}

#[test]
fn test_generated_ids_are_monotonic_in_standard_catalog() {
    let catalog = standard_catalog();
    let ids: Vec<i32> = catalog
        .iter()
        .filter(|entry| entry.kind == CalculationKind::Combination)
        .map(|entry| entry.id.value())
        .collect();

    assert_eq!(ids.len(), 1023);
    assert!(ids.windows(2).all(|pair| pair[1] == pair[0] + 1));
    assert_eq!(ids[0], catalog.id_base() + 1);
}

#[test]
fn test_every_id_and_code_is_unique() {
    let catalog = standard_catalog();
    let ids: HashSet<i32> = catalog.iter().map(|entry| entry.id.value()).collect();
    assert_eq!(ids.len(), catalog.len());

    let full = catalog.base_items().full_width();
    let codes: Vec<String> = catalog
        .iter()
        .filter_map(|entry| entry.code.as_ref())
        .map(|code| code.padded_to(full).to_string())
        .collect();
    let unique: HashSet<&String> = codes.iter().collect();
    assert_eq!(unique.len(), codes.len());
}

#[test]
fn test_catalog_over_six_items() {
    let catalog = CalculationTypeCatalog::build(six_items(), 100).unwrap();
    assert_eq!(catalog.len(), 10 + 63);

    let insurance = catalog.code_for(&[BaseItemKind::MandatoryInsurance]).unwrap();
    assert_eq!(insurance.as_str(), "000010");
    assert_eq!(catalog.lookup_code(&insurance).unwrap().label, "Mandatory Insurance");
}

// =============================================================================
// Residual-Bit Properties
// =============================================================================

#[test]
fn test_residual_check_matches_subset_relation() {
    let items = six_items();
    let width = items.width();
    let expected_sets: Vec<Vec<usize>> = vec![vec![], vec![4], vec![3, 0], vec![0, 1, 2, 3, 4]];

    for expected in &expected_sets {
        let slots: Vec<Option<usize>> = expected.iter().copied().map(Some).collect();
        let allowed: BTreeSet<usize> = expected.iter().copied().collect();

        for subset in subsets(width) {
            let code = Code::from_positions(subset.iter().copied(), width).unwrap();
            let verdict = verify_charge_configuration("Cargo", &code, &slots, &items);
            assert_eq!(
                verdict.is_ok(),
                subset.is_subset(&allowed),
                "code {} against {:?}",
                code,
                expected
            );
        }
    }
}

#[test]
fn test_voluntary_insurance_padding_equivalence() {
    let validator = ConfigurationValidator::standard();
    let width = standard_catalog().base_items().width();

    for subset in subsets(width) {
        let short = Code::from_positions(subset.iter().copied(), width).unwrap();
        let long = short.padded_to(width + 1);

        let verdict = |code: Code| {
            validator
                .verify(&ChargeConfiguration::new(
                    "Seguro Voluntario",
                    ChargeRole::VoluntaryInsuranceFlat,
                    ChargeTime::InstallmentFee,
                    code,
                ))
                .map_err(|err| err.reason().clone())
        };

        assert_eq!(verdict(short), verdict(long));
    }
}

#[test]
fn test_penalty_padding_equivalence() {
    let items = BaseItemCatalog::standard();
    let validator = ConfigurationValidator::new(&items);
    let width = items.width();

    for subset in subsets(width) {
        let short = Code::from_positions(subset.iter().copied(), width).unwrap();
        let long = short.padded_to(width + 1);

        let verdict = |code: Code| {
            validator
                .verify(
                    &ChargeConfiguration::new(
                        "Mora",
                        ChargeRole::Penalty,
                        ChargeTime::OverdueInstallment,
                        code,
                    )
                    .with_interest_rate_link(),
                )
                .is_ok()
        };

        assert_eq!(verdict(short), verdict(long));
    }
}

// =============================================================================
// Scenarios over the six-item catalog
// =============================================================================

#[test]
fn test_scenario_flat_mandatory_insurance_with_insurance_bit_is_valid() {
    let items = six_items();
    let validator = ConfigurationValidator::new(&items);
    let config = ChargeConfiguration::new(
        "Seguro Obligatorio",
        ChargeRole::MandatoryInsuranceFlat,
        ChargeTime::InstallmentFee,
        "000010".parse().unwrap(),
    );
    // FLAT is not part of this catalog and its slot is skipped
    assert!(validator.verify(&config).is_ok());
}

#[test]
fn test_scenario_insurance_plus_honorarios_is_invalid() {
    let items = six_items();
    let validator = ConfigurationValidator::new(&items);
    let config = ChargeConfiguration::new(
        "Seguro Obligatorio",
        ChargeRole::MandatoryInsuranceFlat,
        ChargeTime::InstallmentFee,
        "000011".parse().unwrap(),
    );
    let err = validator.verify(&config).unwrap_err();
    assert_eq!(err.charge_name(), "Seguro Obligatorio");
    assert_eq!(
        err.reason(),
        &ViolationReason::ResidualBits { positions: vec![5] }
    );
}

#[test]
fn test_scenario_aval_without_percentage_table_is_invalid_for_any_code() {
    let items = six_items();
    let validator = ConfigurationValidator::new(&items);

    for subset in subsets(items.width()) {
        let code = Code::from_positions(subset, items.width()).unwrap();
        let config = ChargeConfiguration::new(
            "Aval",
            ChargeRole::Aval,
            ChargeTime::InstallmentFee,
            code,
        );
        assert_eq!(
            validator.verify(&config).unwrap_err().reason(),
            &ViolationReason::PercentageTableRequired
        );
    }
}

#[test]
fn test_residual_positions_reports_every_leftover() {
    let items = six_items();
    let code: Code = "111111".parse().unwrap();
    let residual = residual_positions(&code, &[Some(1), Some(4)], &items).unwrap();
    assert_eq!(residual, vec![0, 2, 3, 5]);
}
