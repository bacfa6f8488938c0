use stencil_fixtures::{
    Pair, PairBuilder, SettingsBuilder, SettingsSubclass, TaggedBuilder, TeamBuilder,
};
use stencil_runtime::{BuildError, ViolationKind};

#[test]
fn optional_field_takes_its_default() {
    let pair = PairBuilder::new().first("alpha").build().unwrap();
    assert_eq!(pair.first(), "alpha");
    assert_eq!(pair.second(), "x");
}

#[test]
fn set_optional_field_overrides_the_default() {
    let pair = PairBuilder::new().second("beta").first("alpha").build().unwrap();
    assert_eq!(pair.second(), "beta");
}

#[test]
fn missing_mandatory_field_is_named() {
    let err = PairBuilder::new().second("y").build().unwrap_err();
    assert_eq!(err.missing_field(), Some("first"));
    assert_eq!(
        err.to_string(),
        "cannot build `Pair`: mandatory field `first` was never set"
    );
}

#[test]
fn first_missing_field_in_field_order_is_reported() {
    let err = TeamBuilder::new().build().unwrap_err();
    assert_eq!(err.missing_field(), Some("name"));

    let err = TeamBuilder::new().name("core").build().unwrap_err();
    assert_eq!(err.missing_field(), Some("members"));
}

#[test]
fn builder_matches_the_entry_point() {
    let built = PairBuilder::new().first("a").second("b").build().unwrap();
    let direct = Pair::new("a".to_string(), "b".to_string()).unwrap();
    assert_eq!(built, direct);
}

#[test]
fn contract_failures_surface_as_build_errors() {
    let err = SettingsBuilder::new().port(80u16).build().unwrap_err();
    match err {
        BuildError::Contract(violation) => {
            assert_eq!(violation.kind, ViolationKind::Precondition);
            assert_eq!(violation.field, Some("port"));
            assert!(violation.message.contains("but was 80"));
        }
        other => panic!("Expected a contract error, got: {:?}", other),
    }
}

#[test]
fn all_optional_types_build_from_defaults() {
    let settings = SettingsSubclass::with_defaults().unwrap();
    assert_eq!(*settings.port(), 8080);
    assert!(!settings.verbose());
    assert_eq!(settings.nickname(), &None);
    assert_eq!(settings, SettingsBuilder::new().build().unwrap());
}

#[test]
fn nullable_constraints_apply_only_to_present_values() {
    let named = SettingsBuilder::new()
        .nickname(String::from("bob"))
        .build()
        .unwrap();
    assert_eq!(named.nickname().as_deref(), Some("bob"));

    let err = SettingsBuilder::new()
        .nickname(String::from("far-too-long"))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::Contract(v) if v.field == Some("nickname")));
}

#[test]
fn helper_fields_default_in_builders() {
    let pair = PairBuilder::new().first("a").build().unwrap();
    let team = TeamBuilder::new()
        .name("core")
        .members(vec![pair])
        .build()
        .unwrap();
    assert!(!team.audited());
    assert_eq!(team.members().len(), 1);
}

#[test]
fn generic_builders_keep_their_parameter() {
    let tagged = TaggedBuilder::<i32>::new()
        .label("answer")
        .value(42)
        .build()
        .unwrap();
    assert_eq!(*tagged.value(), 42);

    let err = TaggedBuilder::<String>::new().value("v").build().unwrap_err();
    assert_eq!(err.missing_field(), Some("label"));
}
