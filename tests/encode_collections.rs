//! Sequence, map and primitive encoding tests

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use sxencode::{Encode, Encoder, Opaque};

fn boxed(value: impl Encode + 'static) -> Box<dyn Encode> {
    Box::new(value)
}

fn not_supported() -> Encoder {
    Encoder::default().with_fallback(|_| Ok("not-support-type".to_string()))
}

#[test]
fn map_drops_entries_without_encoding() {
    let mut map: HashMap<&str, Box<dyn Encode>> = HashMap::new();
    map.insert("bar", boxed("hoge"));
    map.insert("baz", boxed(Opaque(|| ())));

    assert_eq!(sxencode::to_string(&map).unwrap(), r#"(("bar" "hoge"))"#);

    let text = not_supported().to_string(&map).unwrap();
    assert!(
        text == r#"(("bar" "hoge")("baz" not-support-type))"#
            || text == r#"(("baz" not-support-type)("bar" "hoge"))"#,
        "unexpected encoding: {text}"
    );
}

#[test]
fn map_drops_entries_with_empty_keys() {
    let mut map = BTreeMap::new();
    map.insert(None, 1);
    map.insert(Some("k"), 2);
    assert_eq!(sxencode::to_string(&map).unwrap(), r#"(("k" 2))"#);
}

#[test]
fn sequences_keep_every_position() {
    let items: Vec<Box<dyn Encode>> = vec![boxed(1), boxed(Opaque(())), boxed(3)];
    assert_eq!(sxencode::to_string(&items).unwrap(), "#(1 nil 3)");

    let with_gaps = vec![Some(1), None, Some(3)];
    assert_eq!(sxencode::to_string(&with_gaps).unwrap(), "#(1 nil 3)");

    let empty: Vec<i32> = Vec::new();
    assert_eq!(sxencode::to_string(&empty).unwrap(), "#()");
}

#[test]
fn sequence_elements_use_fallback_when_present() {
    let items: Vec<Box<dyn Encode>> = vec![boxed(1), boxed(Opaque(())), boxed(3)];
    assert_eq!(
        not_supported().to_string(&items).unwrap(),
        "#(1 not-support-type 3)"
    );
}

#[test]
fn booleans() {
    assert_eq!(sxencode::to_string(&[true, false]).unwrap(), "#(t nil)");
}

#[test]
fn false_map_value_is_kept() {
    let mut map = BTreeMap::new();
    map.insert("flag", false);
    assert_eq!(sxencode::to_string(&map).unwrap(), r#"(("flag" nil))"#);
}

#[test]
fn nested_collections() {
    let mut inner = BTreeMap::new();
    inner.insert("ahaha", 1);
    inner.insert("ihihi", 2);
    let outer = vec![inner.clone(), inner];
    assert_eq!(
        sxencode::to_string(&outer).unwrap(),
        r#"#((("ahaha" 1)("ihihi" 2)) (("ahaha" 1)("ihihi" 2)))"#
    );
}

#[test]
fn wide_integers_fall_through_to_unsupported() {
    assert_eq!(sxencode::to_string(&vec![1u128 << 100]).unwrap(), "#(nil)");
    assert_eq!(sxencode::to_string(&f64::NAN).unwrap(), "");
}

#[test]
fn one_encoder_serves_many_threads() {
    let encoder = Arc::new(not_supported());
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let encoder = Arc::clone(&encoder);
            thread::spawn(move || {
                let mut sink = Vec::new();
                encoder.encode(&vec![n, n + 1], &mut sink).unwrap();
                String::from_utf8(sink).unwrap()
            })
        })
        .collect();

    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("#({} {})", n, n + 1));
    }
}

proptest! {
    #[test]
    fn integers_print_in_decimal(n in any::<i64>(), u in any::<u64>()) {
        prop_assert_eq!(sxencode::to_string(&n).unwrap(), n.to_string());
        prop_assert_eq!(sxencode::to_string(&u).unwrap(), u.to_string());
    }

    #[test]
    fn boolean_encoding_is_stable(flag in any::<bool>()) {
        let first = sxencode::to_string(&flag).unwrap();
        let second = sxencode::to_string(&flag).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, if flag { "t" } else { "nil" });
    }

    #[test]
    fn finite_floats_read_back(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
        let text = sxencode::to_string(&x).unwrap();
        prop_assert!(text.contains('.') || text.contains('e'));
        prop_assert_eq!(text.parse::<f64>().unwrap(), x);
    }
}
