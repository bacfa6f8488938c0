//! Property-based checks of the generated code.

use proptest::prelude::*;
use stencil_fixtures::{
    Account, Pair, PairBuilder, PairConverter, Readings, ReadingsConverter, TeamBuilder, TeamConverter,
};
use stencil_runtime::Converter;

fn pair() -> impl Strategy<Value = Pair> {
    ("[a-z]{0,6}", "[a-z]{0,6}").prop_map(|(first, second)| {
        Pair::new(first, second).unwrap()
    })
}

proptest! {
    #[test]
    fn pair_round_trips(pair in pair()) {
        let node = PairConverter::export(&pair);
        prop_assert_eq!(PairConverter::import(&node).unwrap(), pair);
    }

    #[test]
    fn team_round_trips(
        name in "[a-z0-9]{1,8}",
        members in prop::collection::vec(pair(), 0..4),
        audited in any::<bool>(),
    ) {
        let team = TeamBuilder::new()
            .name(name)
            .members(members)
            .audited(audited)
            .build()
            .unwrap();
        let node = TeamConverter::export(&team);
        prop_assert_eq!(TeamConverter::import(&node).unwrap(), team);
    }

    #[test]
    fn builder_succeeds_iff_mandatory_fields_are_set(
        first in proptest::option::of("[a-z]{1,4}"),
        second in proptest::option::of("[a-z]{1,4}"),
    ) {
        let mut builder = PairBuilder::new();
        if let Some(first) = &first {
            builder = builder.first(first.clone());
        }
        if let Some(second) = &second {
            builder = builder.second(second.clone());
        }
        match builder.build() {
            Ok(pair) => {
                prop_assert_eq!(Some(pair.first()), first.as_ref());
                prop_assert_eq!(pair.second(), second.as_deref().unwrap_or("x"));
            }
            Err(err) => {
                prop_assert!(first.is_none());
                prop_assert_eq!(err.missing_field(), Some("first"));
            }
        }
    }

    #[test]
    fn normalization_is_idempotent(owner in "[ A-Za-z]{0,12}[A-Za-z][ A-Za-z]{0,12}") {
        let once = Account::open(owner, 0).unwrap();
        let twice = Account::open(once.owner().clone(), 0).unwrap();
        prop_assert_eq!(once.owner(), twice.owner());
    }

    #[test]
    fn ascending_passes_iff_every_neighbour_pair_is_ordered(values in prop::collection::vec(-5i32..5, 0..=3)) {
        let sorted = values.windows(2).all(|w| w[0] <= w[1]);
        prop_assert_eq!(Readings::new(values.clone()).is_ok(), sorted);
        prop_assert_eq!(ReadingsConverter::import(&serde_json::json!([values])).is_ok(), sorted);
    }

    #[test]
    fn equal_instances_hash_equal(a in pair()) {
        let b = Pair::new(a.first().clone(), a.second().clone()).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.hash_code(), b.hash_code());
    }
}
