use form_tree_core::{IdTree, IdentityFields, IdentityInjector, TokenGenerator};
use proptest::prelude::*;
use serde_json::{json, Value};

fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "gatherings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "units": {
                            "type": "array",
                            "items": {"type": "object", "properties": {"taxon": {"type": "string"}}}
                        }
                    }
                }
            }
        }
    })
}

fn unit() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(|taxon| json!({"taxon": taxon})),
        "[a-z]{1,4}".prop_map(|id| json!({"id": id, "taxon": "known"})),
        Just(json!("not an object")),
        // reserved field taken by a value that is not an identity
        prop_oneof![Just(json!(null)), Just(json!("")), Just(json!({"nested": true}))]
            .prop_map(|occupied| json!({"_formTreeId": occupied, "taxon": "kept"})),
    ]
}

fn gathering() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(unit(), 0..4).prop_map(|units| json!({"units": units})),
        Just(json!({"units": {"shape": "mismatch"}})),
        Just(json!(null)),
    ]
}

fn form_data() -> impl Strategy<Value = Value> {
    prop::collection::vec(gathering(), 0..4)
        .prop_map(|gatherings| json!({"gatherings": gatherings, "title": "t"}))
}

proptest! {
    #[test]
    fn strip_undoes_inject(data in form_data(), seed in any::<u64>()) {
        let tree = IdTree::from_schema(&schema());
        let fields = IdentityFields::default();
        let injector = IdentityInjector::new(&tree, &fields);

        let mut injected = data.clone();
        injector.inject_in_place(&mut injected, &mut TokenGenerator::from_u64(seed));
        prop_assert_eq!(injector.strip(&injected).into_owned(), data);
    }

    #[test]
    fn inject_writes_once(data in form_data(), seed in any::<u64>()) {
        let tree = IdTree::from_schema(&schema());
        let fields = IdentityFields::default();
        let injector = IdentityInjector::new(&tree, &fields);
        let mut gen = TokenGenerator::from_u64(seed);

        let (first, _) = injector.inject(&data, &mut gen);
        let first = first.into_owned();
        let (second, mutated) = injector.inject(&first, &mut gen);
        prop_assert!(!mutated);
        prop_assert_eq!(second.into_owned(), first);
    }

    #[test]
    fn in_place_and_copying_inject_agree(data in form_data(), seed in any::<u64>()) {
        let tree = IdTree::from_schema(&schema());
        let fields = IdentityFields::default();
        let injector = IdentityInjector::new(&tree, &fields);

        let mut in_place = data.clone();
        let changed = injector.inject_in_place(&mut in_place, &mut TokenGenerator::from_u64(seed));
        let (copied, mutated) = injector.inject(&data, &mut TokenGenerator::from_u64(seed));
        prop_assert_eq!(changed, mutated);
        prop_assert_eq!(copied.into_owned(), in_place);
    }
}
