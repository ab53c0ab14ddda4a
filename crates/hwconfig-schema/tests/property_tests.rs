use hwconfig_schema::merge::{deep_merge, merge_records};
use hwconfig_schema::template::TemplateExpander;
use hwconfig_schema::{DeviceExpander, TemplateScope};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn test_exact_placeholder_keeps_numbers(n in any::<i64>()) {
        let mut scope = TemplateScope::new();
        scope.insert("$sku-id", Value::from(n));
        let mut config = json!({"identity": {"sku-id": "{{$sku-id}}"}, "label": "sku {{$sku-id}}"});
        let Value::Object(map) = &mut config else { unreachable!() };

        TemplateExpander::new().apply(map, &scope).unwrap();
        prop_assert_eq!(&config["identity"]["sku-id"], &Value::from(n));
        prop_assert_eq!(&config["label"], &Value::from(format!("sku {n}")));
    }

    #[test]
    fn test_variable_chains_reach_fixed_point(len in 1usize..12) {
        let mut scope = TemplateScope::new();
        scope.insert("$v0", Value::from("end"));
        for i in 1..len {
            scope.insert(format!("$v{i}"), Value::from(format!("{{{{$v{}}}}}", i - 1)));
        }
        TemplateExpander::new().resolve_scope(&mut scope).unwrap();
        prop_assert!(!scope.has_unresolved());
        prop_assert_eq!(scope.get(&format!("$v{}", len - 1)), Some(&Value::from("end")));
    }

    #[test]
    fn test_deep_merge_is_deterministic(base in tree(), overlay in tree()) {
        let mut first = base.clone();
        deep_merge(&mut first, &overlay);
        let mut second = base.clone();
        deep_merge(&mut second, &overlay);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_deep_merge_keeps_every_overlay_key(
        base in prop::collection::btree_map("[a-e]", leaf(), 0..5),
        overlay in prop::collection::btree_map("[a-e]", leaf(), 0..5),
    ) {
        let mut merged = Value::Object(base.clone().into_iter().collect());
        deep_merge(&mut merged, &Value::Object(overlay.clone().into_iter().collect()));
        for (key, value) in &overlay {
            prop_assert_eq!(&merged[key], value);
        }
        for (key, value) in &base {
            if !overlay.contains_key(key) {
                prop_assert_eq!(&merged[key], value);
            }
        }
    }

    #[test]
    fn test_deep_merge_is_associative_for_same_shapes(
        docs in prop::collection::vec(
            prop::collection::btree_map("[a-c]", prop::collection::vec(leaf(), 0..3), 0..4),
            3,
        ),
    ) {
        let [a, b, c]: [Value; 3] = docs
            .into_iter()
            .map(|m| json!({"node": Value::Object(
                m.into_iter().map(|(k, v)| (k, Value::Array(v))).collect()
            )}))
            .collect::<Vec<_>>()
            .try_into()
            .unwrap();

        let mut left = a.clone();
        deep_merge(&mut left, &b);
        deep_merge(&mut left, &c);

        let mut right_tail = b.clone();
        deep_merge(&mut right_tail, &c);
        let mut right = a.clone();
        deep_merge(&mut right, &right_tail);

        prop_assert_eq!(left, right);
    }

    #[test]
    fn test_list_merge_is_additive(
        base in prop::collection::vec(leaf(), 0..4),
        overlay in prop::collection::vec(leaf(), 0..4),
    ) {
        let mut merged = json!({"list": base.clone()});
        deep_merge(&mut merged, &json!({"list": overlay.clone()}));
        let expected: Vec<Value> = base.into_iter().chain(overlay).collect();
        prop_assert_eq!(&merged["list"], &Value::Array(expected));
    }

    #[test]
    fn test_unmatched_overlays_are_appended(names in prop::collection::btree_set("[a-z]{3,6}", 1..5)) {
        let mut base = vec![json!({"name": "BASE", "identity": {"sku-id": -1}})];
        let overlays: Vec<Value> = names.iter().map(|n| json!({"name": n})).collect();
        merge_records(&mut base, overlays);
        prop_assert_eq!(base.len(), names.len() + 1);
    }

    #[test]
    fn test_expansion_emits_products_times_skus(products in 1usize..4, skus in 1usize..5) {
        let products: Vec<Value> = (0..products).map(|i| json!({"$brand": format!("B{i}")})).collect();
        let skus: Vec<Value> = (0..skus)
            .map(|i| json!({"$sku-id": i, "config": {"name": "dev", "brand-code": "{{$brand}}", "identity": {"sku-id": "{{$sku-id}}"}}}))
            .collect();
        let device = json!({"products": products.clone(), "skus": skus.clone()});

        let records = DeviceExpander::new().expand_devices(&[device]).unwrap();
        prop_assert_eq!(records.len(), products.len() * skus.len());
        prop_assert_eq!(&records[0]["brand-code"], &Value::from("B0"));
    }
}
