use std::collections::HashSet;

use stencil_fixtures::{
    Account, Doubled, Fixed, Interval, Measurement, Pair, Pairwise, Readings, Tagged, Team, Triple,
};
use stencil_runtime::ViolationKind;

// ============================================================================
// Construction
// ============================================================================

#[test]
fn derived_field_is_computed_at_construction() {
    let doubled = Doubled::new(5).unwrap();
    assert_eq!(*doubled.value(), 5);
    assert_eq!(*doubled.double(), 10);
}

#[test]
fn preconditions_report_the_offending_value() {
    let err = Doubled::new(1000).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Precondition);
    assert_eq!(err.type_name, "Doubled");
    assert_eq!(err.field, Some("value"));
    assert_eq!(err.message, "`value` must be less than 1000 but was 1000");

    let err = Doubled::new(0).unwrap_err();
    assert_eq!(err.message, "`value` must be positive but was 0");
}

#[test]
fn normalization_runs_before_validation_and_storage() {
    let account = Account::open("  Alice ".to_string(), 10).unwrap();
    assert_eq!(account.owner(), "alice");

    let err = Account::open("   ".to_string(), 10).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Precondition);
    assert_eq!(err.field, Some("owner"));
}

#[test]
fn type_invariants_are_checked_on_the_assembled_instance() {
    let err = Account::open("bob".to_string(), -1).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Invariant);
    assert_eq!(err.field, None);
    assert_eq!(err.condition, "self.balance >= 0");

    let err = Interval::between(5, 1).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Invariant);
}

#[test]
fn ensures_is_a_postcondition() {
    let err = Account::open("x".repeat(40), 0).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Postcondition);
}

#[test]
fn properties_take_their_defaults() {
    let account = Account::open("carol".to_string(), 0).unwrap();
    assert_eq!(account.currency(), "EUR");
    assert_eq!(*account.version(), Fixed(1));
}

#[test]
fn factories_and_derivations_over_several_fields() {
    let interval = Interval::between(1, 4).unwrap();
    assert_eq!(*interval.width(), 3);
}

#[test]
fn field_invariants_bind_the_value() {
    let err = Team::new("core team".to_string(), Vec::new(), false).unwrap_err();
    assert_eq!(err.field, Some("name"));
    assert!(err.message.contains("must satisfy"));
}

// ============================================================================
// Ordering and numeric tags
// ============================================================================

#[test]
fn ascending_allows_equal_neighbours() {
    assert!(Readings::new(vec![1, 1, 2]).is_ok());
    let err = Readings::new(vec![2, 1]).unwrap_err();
    assert_eq!(err.message, "`values` must be in ascending order but was [2, 1]");
}

#[test]
fn strict_and_descending_orders() {
    assert!(Pairwise::new(vec![3, 2, 1], vec![5, 5, 1], vec![1, 2], -5).is_ok());

    let err = Pairwise::new(vec![3, 3], vec![], vec![1], -5).unwrap_err();
    assert_eq!(err.field, Some("ranks"));

    let err = Pairwise::new(vec![], vec![1, 2], vec![1], -5).unwrap_err();
    assert_eq!(err.field, Some("scores"));

    let err = Pairwise::new(vec![], vec![], vec![2, 2], -5).unwrap_err();
    assert_eq!(err.field, Some("ids"));
}

#[test]
fn conjoined_contracts_report_the_first_failure_only() {
    let err = Pairwise::new(vec![], vec![], vec![], -5).unwrap_err();
    assert_eq!(err.field, Some("ids"));

    // -3 fails `multiple_of(5)` first even though it is negative.
    let err = Pairwise::new(vec![], vec![], vec![1], -3).unwrap_err();
    assert!(err.message.contains("multiple of 5"), "{}", err.message);

    let err = Pairwise::new(vec![], vec![], vec![1], 5).unwrap_err();
    assert!(err.message.contains("negative"), "{}", err.message);
}

#[test]
fn bounded_collections_reject_extra_elements() {
    let err = Readings::new(vec![1, 2, 3, 4]).unwrap_err();
    assert_eq!(err.field, Some("values"));
}

#[test]
fn float_thresholds() {
    assert!(Measurement::new("m".to_string(), 0.5).is_ok());
    assert!(Measurement::new("m".to_string(), 0.0).is_err());
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn setters_re_derive_dependent_fields() {
    let mut doubled = Doubled::new(5).unwrap();
    doubled.set_value(7).unwrap();
    assert_eq!(*doubled.double(), 14);
}

#[test]
fn failed_setters_leave_the_instance_unchanged() {
    let mut doubled = Doubled::new(5).unwrap();
    assert!(doubled.set_value(-1).is_err());
    assert_eq!(*doubled.value(), 5);
    assert_eq!(*doubled.double(), 10);

    let mut account = Account::open("dave".to_string(), 10).unwrap();
    let err = account.set_balance(-5).unwrap_err();
    assert_eq!(err.kind, ViolationKind::Invariant);
    assert_eq!(*account.balance(), 10);
}

#[test]
fn setters_normalize_and_carried_methods_use_them() {
    let mut account = Account::open("erin".to_string(), 10).unwrap();
    account.set_owner("  ERIN SMITH ").unwrap();
    assert_eq!(account.owner(), "erin smith");

    account.deposit(5).unwrap();
    assert_eq!(*account.balance(), 15);
    assert!(account.deposit(-100).is_err());
    assert_eq!(*account.balance(), 15);
}

// ============================================================================
// Equality, hashing and printing
// ============================================================================

#[test]
fn structural_equality_and_hashing() {
    let a = Pair::new("a".to_string(), "b".to_string()).unwrap();
    let b = Pair::new("a".to_string(), "b".to_string()).unwrap();
    let c = Pair::new("a".to_string(), "c".to_string()).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.hash_code(), b.hash_code());

    let set: HashSet<Pair> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn optional_fields_compare_null_safely() {
    let named = stencil_fixtures::Settings::new(8080, false, Some("n".to_string())).unwrap();
    let anonymous = stencil_fixtures::Settings::new(8080, false, None).unwrap();
    assert_ne!(named, anonymous);
    assert_eq!(anonymous, stencil_fixtures::Settings::new(8080, false, None).unwrap());
}

#[test]
fn generic_types_compare_through_their_parameter() {
    let a = Tagged::new("n".to_string(), 1).unwrap();
    let b = Tagged::new("n".to_string(), 1).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.hash_code(), b.hash_code());
}

#[test]
fn display_lists_fields_in_field_order() {
    let pair = Pair::new("alpha".to_string(), "x".to_string()).unwrap();
    assert_eq!(pair.to_string(), "Pair(first: \"alpha\", second: \"x\")");

    let triple = Triple::of(1, 2, 3).unwrap();
    assert_eq!(triple.to_string(), "Triple(b: 2, c: 3, a: 1)");

    let measurement = Measurement::new("m".to_string(), 1.5).unwrap();
    assert_eq!(measurement.to_string(), "Measurement(unit: \"m\", amount: 1.5)");
}

#[test]
fn carried_methods_are_available() {
    let pair = Pair::new("a".to_string(), "b".to_string()).unwrap();
    assert_eq!(pair.joined(), "ab");
}
