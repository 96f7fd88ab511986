//! S-expression AST model
//!
//! [`Sexpr`] is a passive, immutable tree: lists are chains of [`Sexpr::Cons`]
//! cells ending in [`Sexpr::Null`], arrays are flat with optional dimensions.
//! Values are created through the [`Construct`] callbacks while reading.
//!
//! Cons chains can be arbitrarily long, so cloning, comparison, formatting,
//! serialization and drop walk tails in a loop. Only head nesting recurses.

use std::{fmt, mem};

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::encoder::{Encode, Shape, Unsupported};
use crate::escape::escape_lisp_string;

pub mod build;

pub use build::{Construct, SexprBuilder};

/// A decoded or constructed S-expression.
#[derive(Serialize, Deserialize)]
#[serde(into = "SexprRepr", from = "SexprRepr")]
pub enum Sexpr {
    /// Integer that fits in 64 bits.
    Integer(i64),
    /// Integer beyond the 64-bit range.
    BigInt(BigInt),
    /// Double-precision float.
    Float(f64),
    /// String literal.
    Text(String),
    /// Keyword, stored without its leading colon.
    Keyword(String),
    /// Character literal.
    Char(char),
    /// The true value `t`.
    True,
    /// `nil`, the empty list.
    Null,
    /// A bare symbol.
    Symbol(String),
    /// Pair of head and tail.
    Cons(Box<Sexpr>, Box<Sexpr>),
    /// Flat array; `dims` is present for arrays of rank two or more.
    Array {
        /// Elements in row-major order.
        items: Vec<Sexpr>,
        /// Dimensions, whose product equals `items.len()`.
        dims: Option<Vec<usize>>,
    },
}

impl Sexpr {
    /// Build a cons cell.
    pub fn cons(car: Sexpr, cdr: Sexpr) -> Self {
        Sexpr::Cons(Box::new(car), Box::new(cdr))
    }

    /// Build a proper list from `items`.
    pub fn list(items: impl IntoIterator<Item = Sexpr>) -> Self {
        let items: Vec<Sexpr> = items.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Sexpr::Null, |tail, head| Sexpr::cons(head, tail))
    }

    /// Shorthand for [`Sexpr::Symbol`].
    pub fn symbol(name: impl Into<String>) -> Self {
        Sexpr::Symbol(name.into())
    }

    /// Shorthand for [`Sexpr::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Sexpr::Text(text.into())
    }

    /// True for `nil`.
    pub fn is_null(&self) -> bool {
        matches!(self, Sexpr::Null)
    }

    /// Symbol name, if this is a symbol.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Sexpr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Sexpr::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Iterate over the heads of a cons chain.
    ///
    /// Iteration stops at the first non-cons tail; use [`Sexpr::is_proper_list`]
    /// to tell whether that tail was `nil`.
    pub fn iter(&self) -> ListIter<'_> {
        ListIter { cursor: self }
    }

    /// Collect the elements of a proper list, or `None` if this is not one.
    pub fn to_vec(&self) -> Option<Vec<&Sexpr>> {
        if self.is_proper_list() {
            Some(self.iter().collect())
        } else {
            None
        }
    }

    /// True for `nil` and cons chains terminated by `nil`.
    pub fn is_proper_list(&self) -> bool {
        let mut cursor = self;
        loop {
            match cursor {
                Sexpr::Null => return true,
                Sexpr::Cons(_, tail) => cursor = tail,
                _ => return false,
            }
        }
    }

    /// Human-readable variant name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Sexpr::Integer(_) | Sexpr::BigInt(_) => "integer",
            Sexpr::Float(_) => "float",
            Sexpr::Text(_) => "string",
            Sexpr::Keyword(_) => "keyword",
            Sexpr::Char(_) => "character",
            Sexpr::True => "t",
            Sexpr::Null => "null",
            Sexpr::Symbol(_) => "symbol",
            Sexpr::Cons(..) => "cons",
            Sexpr::Array { .. } => "array",
        }
    }

    /// The first non-cons node reached by following tails.
    fn list_end(&self) -> &Sexpr {
        let mut cursor = self;
        while let Sexpr::Cons(_, tail) = cursor {
            cursor = tail;
        }
        cursor
    }
}

impl Drop for Sexpr {
    fn drop(&mut self) {
        let Sexpr::Cons(_, tail) = self else {
            return;
        };
        let mut next = mem::replace(tail.as_mut(), Sexpr::Null);
        while let Sexpr::Cons(_, tail) = &mut next {
            let rest = mem::replace(tail.as_mut(), Sexpr::Null);
            next = rest;
        }
    }
}

impl Clone for Sexpr {
    fn clone(&self) -> Self {
        match self {
            Sexpr::Integer(num) => Sexpr::Integer(*num),
            Sexpr::BigInt(num) => Sexpr::BigInt(num.clone()),
            Sexpr::Float(num) => Sexpr::Float(*num),
            Sexpr::Text(text) => Sexpr::Text(text.clone()),
            Sexpr::Keyword(name) => Sexpr::Keyword(name.clone()),
            Sexpr::Char(ch) => Sexpr::Char(*ch),
            Sexpr::True => Sexpr::True,
            Sexpr::Null => Sexpr::Null,
            Sexpr::Symbol(name) => Sexpr::Symbol(name.clone()),
            Sexpr::Cons(..) => {
                let heads: Vec<Sexpr> = self.iter().cloned().collect();
                let end = self.list_end().clone();
                heads
                    .into_iter()
                    .rev()
                    .fold(end, |tail, head| Sexpr::cons(head, tail))
            }
            Sexpr::Array { items, dims } => Sexpr::Array {
                items: items.clone(),
                dims: dims.clone(),
            },
        }
    }
}

impl PartialEq for Sexpr {
    fn eq(&self, other: &Self) -> bool {
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Sexpr::Cons(lhead, ltail), Sexpr::Cons(rhead, rtail)) => {
                    if lhead != rhead {
                        return false;
                    }
                    left = ltail;
                    right = rtail;
                }
                (left, right) => return atom_eq(left, right),
            }
        }
    }
}

/// Equality for everything except a pair of cons cells.
fn atom_eq(left: &Sexpr, right: &Sexpr) -> bool {
    match (left, right) {
        (Sexpr::Integer(l), Sexpr::Integer(r)) => l == r,
        (Sexpr::BigInt(l), Sexpr::BigInt(r)) => l == r,
        (Sexpr::Float(l), Sexpr::Float(r)) => l == r,
        (Sexpr::Text(l), Sexpr::Text(r)) => l == r,
        (Sexpr::Keyword(l), Sexpr::Keyword(r)) => l == r,
        (Sexpr::Char(l), Sexpr::Char(r)) => l == r,
        (Sexpr::True, Sexpr::True) | (Sexpr::Null, Sexpr::Null) => true,
        (Sexpr::Symbol(l), Sexpr::Symbol(r)) => l == r,
        (
            Sexpr::Array {
                items: litems,
                dims: ldims,
            },
            Sexpr::Array {
                items: ritems,
                dims: rdims,
            },
        ) => litems == ritems && ldims == rdims,
        _ => false,
    }
}

impl fmt::Debug for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Integer(num) => f.debug_tuple("Integer").field(num).finish(),
            Sexpr::BigInt(num) => f.debug_tuple("BigInt").field(num).finish(),
            Sexpr::Float(num) => f.debug_tuple("Float").field(num).finish(),
            Sexpr::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Sexpr::Keyword(name) => f.debug_tuple("Keyword").field(name).finish(),
            Sexpr::Char(ch) => f.debug_tuple("Char").field(ch).finish(),
            Sexpr::True => f.write_str("True"),
            Sexpr::Null => f.write_str("Null"),
            Sexpr::Symbol(name) => f.debug_tuple("Symbol").field(name).finish(),
            Sexpr::Cons(..) => {
                f.write_str("Cons")?;
                f.debug_list().entries(self.iter()).finish()?;
                match self.list_end() {
                    Sexpr::Null => Ok(()),
                    end => write!(f, " . {:?}", end),
                }
            }
            Sexpr::Array { items, dims } => f
                .debug_struct("Array")
                .field("items", items)
                .field("dims", dims)
                .finish(),
        }
    }
}

/// Serialized form of [`Sexpr`], with cons chains flattened into a vector of
/// heads plus the final tail.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
enum SexprRepr {
    Integer(i64),
    BigInt(BigInt),
    Float(f64),
    Text(String),
    Keyword(String),
    Char(char),
    True,
    Null,
    Symbol(String),
    Cons { items: Vec<Sexpr>, tail: Box<Sexpr> },
    Array { items: Vec<Sexpr>, dims: Option<Vec<usize>> },
}

impl From<Sexpr> for SexprRepr {
    fn from(mut value: Sexpr) -> Self {
        match &mut value {
            Sexpr::Integer(num) => SexprRepr::Integer(*num),
            Sexpr::BigInt(num) => SexprRepr::BigInt(mem::take(num)),
            Sexpr::Float(num) => SexprRepr::Float(*num),
            Sexpr::Text(text) => SexprRepr::Text(mem::take(text)),
            Sexpr::Keyword(name) => SexprRepr::Keyword(mem::take(name)),
            Sexpr::Char(ch) => SexprRepr::Char(*ch),
            Sexpr::True => SexprRepr::True,
            Sexpr::Null => SexprRepr::Null,
            Sexpr::Symbol(name) => SexprRepr::Symbol(mem::take(name)),
            Sexpr::Cons(head, tail) => {
                let mut items = vec![mem::replace(head.as_mut(), Sexpr::Null)];
                let mut cursor = mem::replace(tail.as_mut(), Sexpr::Null);
                while let Sexpr::Cons(head, tail) = &mut cursor {
                    items.push(mem::replace(head.as_mut(), Sexpr::Null));
                    let rest = mem::replace(tail.as_mut(), Sexpr::Null);
                    cursor = rest;
                }
                SexprRepr::Cons {
                    items,
                    tail: Box::new(cursor),
                }
            }
            Sexpr::Array { items, dims } => SexprRepr::Array {
                items: mem::take(items),
                dims: dims.take(),
            },
        }
    }
}

impl From<SexprRepr> for Sexpr {
    fn from(repr: SexprRepr) -> Self {
        match repr {
            SexprRepr::Integer(num) => Sexpr::Integer(num),
            SexprRepr::BigInt(num) => Sexpr::BigInt(num),
            SexprRepr::Float(num) => Sexpr::Float(num),
            SexprRepr::Text(text) => Sexpr::Text(text),
            SexprRepr::Keyword(name) => Sexpr::Keyword(name),
            SexprRepr::Char(ch) => Sexpr::Char(ch),
            SexprRepr::True => Sexpr::True,
            SexprRepr::Null => Sexpr::Null,
            SexprRepr::Symbol(name) => Sexpr::Symbol(name),
            SexprRepr::Cons { items, tail } => items
                .into_iter()
                .rev()
                .fold(*tail, |tail, head| Sexpr::cons(head, tail)),
            SexprRepr::Array { items, dims } => Sexpr::Array { items, dims },
        }
    }
}

/// Iterator over the heads of a cons chain.
pub struct ListIter<'a> {
    cursor: &'a Sexpr,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Sexpr;

    fn next(&mut self) -> Option<Self::Item> {
        match self.cursor {
            Sexpr::Cons(head, tail) => {
                self.cursor = tail;
                Some(head)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Sexpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexpr::Integer(num) => write!(f, "{}", num),
            Sexpr::BigInt(num) => write!(f, "{}", num),
            Sexpr::Float(num) => write!(f, "{:?}", num),
            Sexpr::Text(text) => write!(f, "\"{}\"", escape_lisp_string(text)),
            Sexpr::Keyword(name) => write!(f, ":{}", name),
            Sexpr::Char(ch) => match char_name(*ch) {
                Some(name) => write!(f, "#\\{}", name),
                None => write!(f, "#\\{}", ch),
            },
            Sexpr::True => f.write_str("t"),
            Sexpr::Null => f.write_str("nil"),
            Sexpr::Symbol(name) => f.write_str(name),
            Sexpr::Cons(head, tail) => {
                write!(f, "({}", head)?;
                let mut cursor = tail.as_ref();
                loop {
                    match cursor {
                        Sexpr::Null => break,
                        Sexpr::Cons(head, tail) => {
                            write!(f, " {}", head)?;
                            cursor = tail;
                        }
                        other => {
                            write!(f, " . {}", other)?;
                            break;
                        }
                    }
                }
                f.write_str(")")
            }
            Sexpr::Array { items, dims } => match dims {
                Some(dims) if dims.len() > 1 => {
                    write!(f, "#{}A", dims.len())?;
                    write_nested(f, items, dims)
                }
                _ => {
                    f.write_str("#(")?;
                    write_joined(f, items)?;
                    f.write_str(")")
                }
            },
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Sexpr]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Print a row-major slice as nested lists following `dims`.
fn write_nested(f: &mut fmt::Formatter<'_>, items: &[Sexpr], dims: &[usize]) -> fmt::Result {
    f.write_str("(")?;
    match dims {
        [] | [_] => write_joined(f, items)?,
        [count, rest @ ..] => {
            let stride = rest.iter().product::<usize>();
            for index in 0..*count {
                if index > 0 {
                    f.write_str(" ")?;
                }
                let start = (index * stride).min(items.len());
                let end = (start + stride).min(items.len());
                write_nested(f, &items[start..end], rest)?;
            }
        }
    }
    f.write_str(")")
}

/// Names used for characters that would not read back as themselves.
pub(crate) fn char_name(ch: char) -> Option<&'static str> {
    match ch {
        ' ' => Some("space"),
        '\n' => Some("newline"),
        '\t' => Some("tab"),
        '\r' => Some("return"),
        _ => None,
    }
}

impl Encode for Sexpr {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::with_detail(self))
    }

    fn sexpression(&self) -> Option<String> {
        Some(self.to_string())
    }
}
