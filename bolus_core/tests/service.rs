use bolus_config::{ProfileRow, load_toml, parse_profiles_csv};
use bolus_core::conversions::configured_mode;
use bolus_core::mocks::UnavailableProfileStore;
use bolus_core::{
    ActivityLevel, BolusService, CalculationMode, CalculatorCfg, DoseCalculator, DoseError,
    DoseRequest, InMemoryProfileStore, MedicalProfile, UserId,
};
use rstest::{fixture, rstest};

const CSV: &str = "\
user_id,insulin_carb_ratio,correction_factor,target_glucose,sick_day_percent,stress_percent,light_exercise_percent,intense_exercise_percent
alice,1:10,50,100,,,,
bob,0.05,40,110,20,10,15,30
carol,,,,,,,
";

#[fixture]
fn service() -> BolusService<InMemoryProfileStore> {
    let rows = parse_profiles_csv(CSV).unwrap();
    let store = InMemoryProfileStore::from_rows(&rows).unwrap();
    BolusService::new(store, DoseCalculator::default())
}

#[rstest]
fn store_decodes_ratio_notation(service: BolusService<InMemoryProfileStore>) {
    let alice = service.lookup(&UserId::from("alice")).unwrap().unwrap();
    assert!((alice.insulin_carb_ratio.unwrap() - 0.1).abs() < 1e-7);
    let bob = service.lookup(&UserId::from("bob")).unwrap().unwrap();
    assert!((bob.insulin_carb_ratio.unwrap() - 0.05).abs() < 1e-7);
    assert_eq!(bob.sick_day_percent, Some(20));
    assert_eq!(service.store().users().len(), 3);
}

#[rstest]
fn unknown_user_is_not_an_error(service: BolusService<InMemoryProfileStore>) {
    assert_eq!(service.lookup(&UserId::from("dave")).unwrap(), None);
    let b = service
        .dose(Some(&UserId::from("dave")), &DoseRequest::new(50.0), None)
        .unwrap();
    assert_eq!(b.mode, CalculationMode::Simple);
    assert!(!b.profile_complete);
}

#[rstest]
fn mode_is_inferred_from_request(service: BolusService<InMemoryProfileStore>) {
    let alice = UserId::from("alice");
    let plain = service
        .dose_for(&alice, &DoseRequest::new(50.0), None)
        .unwrap();
    assert_eq!(plain.mode, CalculationMode::Simple);

    let sick = DoseRequest {
        sick_mode: true,
        ..DoseRequest::new(50.0)
    };
    let adjusted = service.dose_for(&alice, &sick, None).unwrap();
    assert_eq!(adjusted.mode, CalculationMode::Full);
    assert!((adjusted.total_dose - 5.75).abs() < 1e-4);
}

#[rstest]
fn explicit_mode_beats_service_default(service: BolusService<InMemoryProfileStore>) {
    let service = service.with_default_mode(Some(CalculationMode::Full));
    let alice = UserId::from("alice");
    let by_default = service
        .dose_for(&alice, &DoseRequest::new(50.0), None)
        .unwrap();
    assert_eq!(by_default.mode, CalculationMode::Full);
    let explicit = service
        .dose(
            Some(&alice),
            &DoseRequest::new(50.0),
            Some(CalculationMode::Simple),
        )
        .unwrap();
    assert_eq!(explicit.mode, CalculationMode::Simple);
}

#[rstest]
fn incomplete_stored_profile_prompts_in_full_mode(service: BolusService<InMemoryProfileStore>) {
    let req = DoseRequest {
        activity_level: Some(ActivityLevel::Light),
        ..DoseRequest::new(45.0)
    };
    let b = service.dose(Some(&UserId::from("carol")), &req, None).unwrap();
    assert!(!b.profile_complete);
    assert_eq!(b.missing_fields.len(), 3);
    assert_eq!(b.rounded_dose, 0.0);
}

#[rstest]
fn resolved_profile_reports_stored_percents(service: BolusService<InMemoryProfileStore>) {
    let r = service.resolved_profile(&UserId::from("bob")).unwrap();
    assert!(r.is_complete());
    assert_eq!(r.adjustments.sick_day, 20);
    let r = service.resolved_profile(&UserId::from("carol")).unwrap();
    assert!(!r.is_complete());
    assert_eq!(r.adjustments.sick_day, 15);
}

#[rstest]
fn profile_changes_are_seen_on_next_call() {
    let mut store = InMemoryProfileStore::new();
    let user = UserId::from("erin");
    store.insert(
        user.clone(),
        MedicalProfile {
            insulin_carb_ratio: Some(0.1),
            correction_factor: Some(50.0),
            target_glucose: Some(100),
            ..MedicalProfile::default()
        },
    );
    let first = BolusService::new(store.clone(), DoseCalculator::default())
        .dose(Some(&user), &DoseRequest::new(60.0), None)
        .unwrap();
    store.insert(
        user.clone(),
        MedicalProfile {
            insulin_carb_ratio: Some(0.2),
            correction_factor: Some(50.0),
            target_glucose: Some(100),
            ..MedicalProfile::default()
        },
    );
    let second = BolusService::new(store, DoseCalculator::default())
        .dose(Some(&user), &DoseRequest::new(60.0), None)
        .unwrap();
    assert!((first.total_dose - 6.0).abs() < 1e-4);
    assert!((second.total_dose - 12.0).abs() < 1e-4);
}

#[rstest]
fn store_failure_maps_to_typed_error() {
    let service = BolusService::new(UnavailableProfileStore, DoseCalculator::default());
    let err = service
        .dose(Some(&UserId::from("alice")), &DoseRequest::new(10.0), None)
        .expect_err("store is down");
    match err.downcast_ref::<DoseError>() {
        Some(DoseError::ProfileStore(msg)) => assert!(msg.contains("unavailable")),
        other => panic!("expected ProfileStore, got: {other:?}"),
    }
}

#[rstest]
fn anonymous_dose_skips_the_store() {
    let service = BolusService::new(UnavailableProfileStore, DoseCalculator::default());
    let b = service.dose(None, &DoseRequest::new(50.0), None).unwrap();
    assert!((b.total_dose - 5.0).abs() < 1e-4);
}

#[rstest]
fn unreadable_ratio_cell_is_rejected() {
    let rows = vec![ProfileRow {
        user_id: "frank".to_string(),
        insulin_carb_ratio: Some("1:x".to_string()),
        correction_factor: Some(50.0),
        target_glucose: Some(100),
        sick_day_percent: None,
        stress_percent: None,
        light_exercise_percent: None,
        intense_exercise_percent: None,
    }];
    let err = InMemoryProfileStore::from_rows(&rows).expect_err("bad ratio");
    match err.downcast_ref::<DoseError>() {
        Some(DoseError::Config(msg)) => assert!(msg.contains("frank")),
        other => panic!("expected Config, got: {other:?}"),
    }
}

#[rstest]
fn config_document_drives_the_calculator() {
    let cfg = load_toml(
        r#"
[fallback]
insulin_carb_ratio = 0.2

[warnings]
high_dose_units = 30.0

[calculation]
mode = "simple"
"#,
    )
    .unwrap();
    cfg.validate().unwrap();
    let calc = DoseCalculator::new(CalculatorCfg::from(&cfg)).unwrap();
    assert_eq!(configured_mode(&cfg.calculation), Some(CalculationMode::Simple));

    let b = calc.calculate_simple(&DoseRequest::new(100.0), None).unwrap();
    assert!((b.total_dose - 20.0).abs() < 1e-4);
    // 20 units is under the configured 30-unit threshold
    assert_eq!(b.warning, None);
}
