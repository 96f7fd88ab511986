//! Reading encoder output back through the constructor callbacks

use std::cell::RefCell;
use std::collections::BTreeMap;

use num_bigint::BigInt;
use sxencode::{Construct, Sexpr, SexprBuilder, encode_record, read_all, read_one};

struct Item {
    name: String,
    price: f64,
    tags: Vec<String>,
}

encode_record!(Item { name, price, tags = "labels" });

struct Order {
    id: u32,
    items: Vec<Item>,
    note: Option<String>,
}

encode_record!(Order { id, items, note });

fn order() -> Order {
    Order {
        id: 7,
        items: vec![
            Item {
                name: "tea \"green\"".to_string(),
                price: 3.5,
                tags: vec!["hot".to_string()],
            },
            Item {
                name: "cake".to_string(),
                price: 4.0,
                tags: Vec::new(),
            },
        ],
        note: None,
    }
}

/// Look up `(name value)` inside a decoded record.
fn field<'a>(record: &'a Sexpr, name: &str) -> Option<&'a Sexpr> {
    record.iter().find_map(|entry| {
        let parts = entry.to_vec()?;
        match parts.as_slice() {
            [key, value] if key.as_symbol() == Some(name) => Some(*value),
            _ => None,
        }
    })
}

#[test]
fn record_with_sequence_of_records_reads_back() {
    let text = sxencode::to_string(&order()).unwrap();
    assert_eq!(
        text,
        r#"((struct Order)(id 7)(items #(((struct Item)(name "tea \"green\"")(price 3.5)(labels #("hot"))) ((struct Item)(name "cake")(price 4.0)(labels #())))))"#
    );

    let decoded = read_one(&text, &SexprBuilder).unwrap();
    let header = decoded.iter().next().unwrap();
    assert_eq!(
        *header,
        Sexpr::list([Sexpr::symbol("struct"), Sexpr::symbol("Order")])
    );
    assert_eq!(field(&decoded, "id"), Some(&Sexpr::Integer(7)));
    assert_eq!(field(&decoded, "note"), None);

    let Some(Sexpr::Array { items, dims: None }) = field(&decoded, "items") else {
        panic!("items should decode as a vector");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(field(&items[0], "name"), Some(&Sexpr::text("tea \"green\"")));
    assert_eq!(field(&items[1], "price"), Some(&Sexpr::Float(4.0)));
}

#[test]
fn printing_decoded_text_is_stable() {
    let text = sxencode::to_string(&order()).unwrap();
    let decoded = read_one(&text, &SexprBuilder).unwrap();
    let printed = decoded.to_string();
    assert_eq!(read_one(&printed, &SexprBuilder).unwrap(), decoded);
}

#[test]
fn large_map_reads_back_and_drops() {
    let map: BTreeMap<u32, u32> = (0..200_000).map(|n| (n, n * 2)).collect();
    let text = sxencode::to_string(&map).unwrap();

    let decoded = read_one(&text, &SexprBuilder).unwrap();
    assert!(decoded.is_proper_list());
    assert_eq!(decoded.iter().count(), 200_000);

    let last = decoded.iter().last().unwrap();
    assert_eq!(
        *last,
        Sexpr::list([Sexpr::Integer(199_999), Sexpr::Integer(399_998)])
    );

    let copy = decoded.clone();
    assert_eq!(copy, decoded);
    assert_eq!(copy.to_string(), text.replace(")(", ") ("));
}

/// Builder that records which callbacks fire, in order.
#[derive(Default)]
struct Trace {
    calls: RefCell<Vec<String>>,
}

impl Trace {
    fn log(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }
}

impl Construct for Trace {
    type Node = ();

    fn int(&self, value: i64) {
        self.log(format!("int {value}"));
    }

    fn big_int(&self, value: BigInt) {
        self.log(format!("big-int {value}"));
    }

    fn float(&self, value: f64) {
        self.log(format!("float {value}"));
    }

    fn string(&self, value: String) {
        self.log(format!("string {value}"));
    }

    fn array(&self, items: Vec<()>, dims: Vec<usize>) {
        self.log(format!("array {} {:?}", items.len(), dims));
    }

    fn keyword(&self, name: String) {
        self.log(format!("keyword {name}"));
    }

    fn character(&self, value: char) {
        self.log(format!("char {value}"));
    }

    fn symbol(&self, name: String) {
        self.log(format!("symbol {name}"));
    }

    fn null(&self) {
        self.log("null");
    }

    fn t(&self) {
        self.log("t");
    }

    fn cons(&self, _car: (), _cdr: ()) {
        self.log("cons");
    }
}

#[test]
fn callbacks_fire_in_lexical_order() {
    let trace = Trace::default();
    read_all(
        "(a :b) #(1 2.5) \"s\" #\\x t nil 99999999999999999999",
        &trace,
    )
    .unwrap();
    assert_eq!(
        trace.calls.into_inner(),
        vec![
            "symbol a",
            "keyword b",
            "null",
            "cons",
            "cons",
            "int 1",
            "float 2.5",
            "array 2 [2]",
            "string s",
            "char x",
            "t",
            "null",
            "big-int 99999999999999999999",
        ]
    );
}
