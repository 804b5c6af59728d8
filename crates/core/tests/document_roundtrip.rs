use oxn_core::{Document, DocumentFormat};
use proptest::prelude::*;
use serde_json::Map;

fn arb_document() -> impl Strategy<Value = Document> {
    let leaf = prop_oneof![
        Just(Document::Null),
        any::<bool>().prop_map(Document::from),
        any::<i64>().prop_map(Document::from),
        "[a-zA-Z0-9 _.:-]{0,16}".prop_map(Document::from),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Document::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                .prop_map(|m| Document::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn yaml_round_trip(doc in arb_document()) {
        let text = DocumentFormat::Yaml.render(&doc).unwrap();
        let back = DocumentFormat::Yaml.parse(&text).unwrap();
        prop_assert_eq!(back, doc);
    }

    #[test]
    fn json_round_trip(doc in arb_document()) {
        let text = DocumentFormat::Json.render(&doc).unwrap();
        let back = DocumentFormat::Json.parse(&text).unwrap();
        prop_assert_eq!(back, doc);
    }
}
