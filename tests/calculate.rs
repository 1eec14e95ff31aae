use std::fs;

use cbam_cost_core::batch::{read_requests, run_batch, INPUT_COLUMNS, RESULT_COLUMNS};
use cbam_cost_core::loader::load_tables;
use cbam_cost_core::tables::GENERIC_COUNTRY;
use cbam_cost_core::{
    calculate, BenchmarkEntry, BenchmarkTable, BenchmarkTier, CalculationRequest, CountryScope,
    DefaultEmissionsEntry, DefaultsTable, EmissionsProvenance, ReferenceTables, RequestGuard,
    RequestInput,
};
use proptest::prelude::*;

fn defaults_row(country: &str, prefix: &str, v: [f64; 3]) -> DefaultEmissionsEntry {
    DefaultEmissionsEntry::new(country, prefix, Some(v[0]), Some(v[1]), Some(v[2])).unwrap()
}

fn tables() -> ReferenceTables {
    ReferenceTables {
        benchmarks: BenchmarkTable::new(vec![
            BenchmarkEntry::from_cells("7202", "A", "", 0.9).unwrap(),
            BenchmarkEntry::from_cells("7202", "A", "1", 0.702).unwrap(),
            BenchmarkEntry::from_cells("7202", "A", "2", 0.65).unwrap(),
            BenchmarkEntry::from_cells("7202", "", "1", 0.8).unwrap(),
            BenchmarkEntry::from_cells("2523", "", "", 0.666).unwrap(),
        ]),
        defaults: DefaultsTable::new(vec![
            defaults_row("China", "72024910", [2.103, 2.2, 2.4]),
            defaults_row("Oman", "72024910", [9.9; 3]),
            defaults_row("Nigeria", "72024910", [7.7; 3]),
            defaults_row("Niger", "7202", [1.1; 3]),
            defaults_row(GENERIC_COUNTRY, "72024910", [4.5, 4.6, 4.7]),
            defaults_row(GENERIC_COUNTRY, "2523", [0.9; 3]),
        ]),
    }
}

fn input(code: &str, country: &str, year: i32) -> RequestInput {
    RequestInput {
        hs_code: code.into(),
        country_origin: country.into(),
        year: Some(year),
        actual_direct_emissions: None,
        production_route_tag: Some("A".into()),
        volume_imported_tn: Some(10.0),
        ets_price_eur: Some(75.0),
        free_allowance_perc: Some(97.5),
        already_paid_eur: None,
    }
}

fn request(input: RequestInput) -> CalculationRequest {
    RequestGuard::validate_request(&input).unwrap()
}

#[test]
fn ferro_alloy_reference_case() {
    let calc = calculate(&request(input("72024910", "China", 2026)), &tables());
    assert_eq!(calc.resolution.benchmark.tier, BenchmarkTier::RouteAndPeriod);
    assert_eq!(calc.resolution.benchmark_value(), 0.702);
    assert_eq!(calc.resolution.emissions_value(), 2.103);
    assert!((calc.cost.emissions_gap - 1.41855).abs() < 1e-9);
    assert!((calc.cost.unit_cost - 106.39125).abs() < 1e-9);
    assert!((calc.cost.total_cost - 1063.9125).abs() < 1e-6);
}

#[test]
fn route_and_period_beats_route_only() {
    let calc = calculate(&request(input("72024910", "China", 2030)), &tables());
    assert_eq!(calc.resolution.benchmark.tier, BenchmarkTier::RouteAndPeriod);
    assert_eq!(calc.resolution.benchmark_value(), 0.65);
}

#[test]
fn unknown_country_falls_back_to_generic_defaults() {
    let calc = calculate(&request(input("72024910", "France", 2027)), &tables());
    assert_eq!(calc.resolution.emissions_value(), 4.6);
    assert_eq!(
        calc.resolution.emissions.provenance,
        EmissionsProvenance::Default {
            scope: CountryScope::Generic,
            prefix_len: 8
        }
    );
}

#[test]
fn country_named_inside_another_falls_back_to_generic() {
    let calc = calculate(&request(input("72024910", "Romania", 2026)), &tables());
    assert_eq!(calc.resolution.emissions_value(), 4.5);
    assert_eq!(
        calc.resolution.emissions.provenance,
        EmissionsProvenance::Default {
            scope: CountryScope::Generic,
            prefix_len: 8
        }
    );
}

#[test]
fn own_country_row_beats_longer_lookalike_row() {
    let calc = calculate(&request(input("72024910", "Niger", 2026)), &tables());
    assert_eq!(calc.resolution.emissions_value(), 1.1);
    assert_eq!(
        calc.resolution.emissions.provenance,
        EmissionsProvenance::Default {
            scope: CountryScope::Country,
            prefix_len: 4
        }
    );

    let calc = calculate(&request(input("72024910", "nigeria", 2026)), &tables());
    assert_eq!(calc.resolution.emissions_value(), 7.7);
}

#[test]
fn untagged_request_takes_period_only_benchmark() {
    let calc = calculate(
        &request(RequestInput {
            production_route_tag: None,
            ..input("72024910", "China", 2026)
        }),
        &tables(),
    );
    assert_eq!(calc.resolution.benchmark.tier, BenchmarkTier::PeriodOnly);
    assert_eq!(calc.resolution.benchmark_value(), 0.8);
}

proptest! {
    #[test]
    fn positive_actual_emissions_are_echoed(actual in 0.0001f64..50.0, year in 2026i32..=2100) {
        let calc = calculate(
            &request(RequestInput {
                actual_direct_emissions: Some(actual),
                ..input("72024910", "China", year)
            }),
            &tables(),
        );
        prop_assert_eq!(calc.resolution.emissions.provenance, EmissionsProvenance::Actual);
        prop_assert_eq!(calc.resolution.emissions_value(), actual);
    }

    #[test]
    fn zero_or_absent_actual_never_reports_actual(
        zero in any::<bool>(),
        code in "[0-9]{4,8}",
        year in 2026i32..=2100,
    ) {
        let actual = if zero { Some(0.0) } else { None };
        let calc = calculate(
            &request(RequestInput {
                actual_direct_emissions: actual,
                ..input(&code, "China", year)
            }),
            &tables(),
        );
        prop_assert!(calc.resolution.emissions.provenance.is_default());
    }

    #[test]
    fn total_is_never_negative(
        actual in prop::option::of(0.0f64..10.0),
        volume in 0.0f64..1.0e6,
        price in 0.0f64..500.0,
        allowance in 0.0f64..=100.0,
        paid in prop::option::of(0.0f64..1.0e7),
    ) {
        let calc = calculate(
            &request(RequestInput {
                actual_direct_emissions: actual,
                volume_imported_tn: Some(volume),
                ets_price_eur: Some(price),
                free_allowance_perc: Some(allowance),
                already_paid_eur: paid,
                ..input("72024910", "China", 2026)
            }),
            &tables(),
        );
        prop_assert!(calc.cost.total_cost >= 0.0);
    }

    #[test]
    fn calculation_is_repeatable(
        code in "[0-9]{4,8}",
        country in "[A-Za-z ]{1,20}",
        year in 2026i32..=2100,
    ) {
        prop_assume!(!country.trim().is_empty());
        let tables = tables();
        let req = request(input(&code, &country, year));
        prop_assert_eq!(calculate(&req, &tables), calculate(&req, &tables));
    }
}

#[test]
fn batch_round_trip_through_files() {
    let dir = tempfile::tempdir().unwrap();
    let bench = dir.path().join("bench.csv");
    let defaults = dir.path().join("defaults.csv");
    let sheet = dir.path().join("input.csv");

    fs::write(
        &bench,
        "CN_code,Main_Tag,Year_Tag,Benchmark_Value\n7202,A,2026-27,0.702\n2523,,,0.666\n",
    )
    .unwrap();
    fs::write(
        &defaults,
        "Country,Product CN Code,2026 Default Value (Including mark-up),\
         2027 Default Value (Including mark-up),2028 Default Value (Including mark-up)\n\
         China,72024910,2.103,2.2,2.4\n\
         \"Korea, Republic of\",7202,3.3,3.3,3.3\n\
         Other Countries and Territories,2523,0.9,0.9,0.9\n",
    )
    .unwrap();
    fs::write(
        &sheet,
        format!(
            "{}\n\
             72024910,China,2026,0,A,10,75,97.5,0\n\
             \"2523 10 00\",\"Korea, Republic of\",2026,,,100,80,90,\n\
             72024910,Korea,2026,,A,1,75,97.5,\n",
            INPUT_COLUMNS.join(",")
        ),
    )
    .unwrap();

    let tables = load_tables(&bench, &defaults).unwrap();
    let requests = read_requests(&sheet, 0.0).unwrap();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].0, 3);

    let report = run_batch(&tables, requests);
    assert_eq!(report.summary.rows, 3);
    assert_eq!(report.summary.unresolved_benchmarks, 0);
    assert_eq!(report.summary.unresolved_defaults, 0);

    let cement = &report.rows[1].calculation;
    assert_eq!(cement.resolution.benchmark.tier, BenchmarkTier::AnyForProduct);
    assert!(matches!(
        cement.resolution.emissions.provenance,
        EmissionsProvenance::Default {
            scope: CountryScope::Generic,
            prefix_len: 4
        }
    ));

    let korea = &report.rows[2].calculation;
    assert_eq!(korea.resolution.emissions_value(), 3.3);

    let out = dir.path().join("results.csv");
    report.write_csv(fs::File::create(&out).unwrap()).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written.lines().next(), Some(RESULT_COLUMNS.join(",").as_str()));
    assert_eq!(written.lines().count(), 4);
}
