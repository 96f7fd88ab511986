//! Constructor callbacks invoked while reading S-expressions.
//!
//! A reader owns the scanning loop and calls one [`Construct`] method per
//! lexical item, in source order. Implementations only assemble nodes; they
//! take `&self` so two token streams can be read with the same builder at once.

use num_bigint::BigInt;

use super::Sexpr;

/// One constructor per lexical category.
pub trait Construct {
    /// Node type produced by this builder.
    type Node;

    /// Integer that fits in 64 bits.
    fn int(&self, value: i64) -> Self::Node;

    /// Integer literal beyond the 64-bit range.
    fn big_int(&self, value: BigInt) -> Self::Node;

    /// Floating-point literal.
    fn float(&self, value: f64) -> Self::Node;

    /// String literal, already unescaped.
    fn string(&self, value: String) -> Self::Node;

    /// Array with its elements in row-major order and its dimensions.
    ///
    /// A plain vector `#(…)` arrives with a single dimension.
    fn array(&self, items: Vec<Self::Node>, dims: Vec<usize>) -> Self::Node;

    /// Keyword, without its leading colon.
    fn keyword(&self, name: String) -> Self::Node;

    /// Character literal.
    fn character(&self, value: char) -> Self::Node;

    /// Bare symbol. Never called for keywords.
    fn symbol(&self, name: String) -> Self::Node;

    /// `nil` or `()`.
    fn null(&self) -> Self::Node;

    /// `t`.
    fn t(&self) -> Self::Node;

    /// Pair of two already-built nodes.
    fn cons(&self, car: Self::Node, cdr: Self::Node) -> Self::Node;
}

/// Builder producing [`Sexpr`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct SexprBuilder;

impl Construct for SexprBuilder {
    type Node = Sexpr;

    fn int(&self, value: i64) -> Sexpr {
        Sexpr::Integer(value)
    }

    fn big_int(&self, value: BigInt) -> Sexpr {
        // Keep small values in the fixed-width variant so equal numbers compare equal.
        match i64::try_from(&value) {
            Ok(small) => Sexpr::Integer(small),
            Err(_) => Sexpr::BigInt(value),
        }
    }

    fn float(&self, value: f64) -> Sexpr {
        Sexpr::Float(value)
    }

    fn string(&self, value: String) -> Sexpr {
        Sexpr::Text(value)
    }

    fn array(&self, items: Vec<Sexpr>, dims: Vec<usize>) -> Sexpr {
        let dims = if dims.len() > 1 { Some(dims) } else { None };
        Sexpr::Array { items, dims }
    }

    fn keyword(&self, name: String) -> Sexpr {
        Sexpr::Keyword(name)
    }

    fn character(&self, value: char) -> Sexpr {
        Sexpr::Char(value)
    }

    fn symbol(&self, name: String) -> Sexpr {
        Sexpr::Symbol(name)
    }

    fn null(&self) -> Sexpr {
        Sexpr::Null
    }

    fn t(&self) -> Sexpr {
        Sexpr::True
    }

    fn cons(&self, car: Sexpr, cdr: Sexpr) -> Sexpr {
        Sexpr::cons(car, cdr)
    }
}
