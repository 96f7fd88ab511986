//! Structural classification of encodable values.
//!
//! Every value handed to the [`Encoder`](super::Encoder) implements [`Encode`],
//! which reports the value's shape as a closed [`Shape`] enum. The encoder
//! matches on that enum instead of inspecting types at runtime.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::BuildHasher;
use std::rc::Rc;
use std::sync::Arc;

use super::record::Record;

/// A value the encoder knows how to render.
pub trait Encode {
    /// Report the structural shape of this value.
    fn shape(&self) -> Shape<'_>;

    /// Custom rendering that bypasses structural dispatch.
    ///
    /// When this returns `Some`, the text is written verbatim and [`Encode::shape`]
    /// is never consulted.
    fn sexpression(&self) -> Option<String> {
        None
    }
}

/// Shape classes understood by the encoder.
pub enum Shape<'a> {
    /// Named fields described by a schema.
    Record(Record<'a>),
    /// Ordered elements, rendered as a vector.
    Sequence(Vec<&'a dyn Encode>),
    /// Key/value pairs, in whatever order the container yields them.
    Map(Vec<(&'a dyn Encode, &'a dyn Encode)>),
    /// Text, rendered as a quoted Lisp string.
    Str(&'a str),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Double-precision float.
    Float(f64),
    /// Single-precision float, printed at its own precision.
    Float32(f32),
    /// Boolean, rendered as `t` or `nil`.
    Bool(bool),
    /// Indirection to another value; `None` renders nothing.
    Ref(Option<&'a dyn Encode>),
    /// A value with no structural encoding.
    Unsupported(Unsupported<'a>),
}

/// Description of a value the encoder cannot classify.
///
/// This is what a fallback handler receives. When the value itself is
/// available it can be recovered with [`Unsupported::downcast_ref`].
#[derive(Debug, Clone)]
pub struct Unsupported<'a> {
    type_name: &'static str,
    value: Option<&'a (dyn Any + 'static)>,
    detail: Option<String>,
}

impl<'a> Unsupported<'a> {
    /// Describe a value of type `T` by its type alone.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            type_name: type_name::<T>(),
            value: None,
            detail: None,
        }
    }

    /// Describe `value`, lending it to the handler.
    pub fn new<T: Any>(value: &'a T) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Some(value),
            detail: None,
        }
    }

    /// Like [`Unsupported::new`], also keeping the `Debug` rendering.
    pub fn with_detail<T: Any + fmt::Debug>(value: &'a T) -> Self {
        Self {
            detail: Some(format!("{:?}", value)),
            ..Self::new(value)
        }
    }

    /// Full Rust type name of the value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The value itself, when it was lent.
    pub fn value(&self) -> Option<&'a (dyn Any + 'static)> {
        self.value
    }

    /// The value as a `T`, if it was lent and has that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.value?.downcast_ref::<T>()
    }

    /// `Debug` rendering of the value, when one was captured.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// Wrapper marking a value as opaque to the encoder.
///
/// Useful for fields such as callbacks or handles that should be left to the
/// fallback handler (or dropped when there is none).
#[derive(Clone, Copy, Default)]
pub struct Opaque<T>(pub T);

impl<T> fmt::Debug for Opaque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque<{}>", type_name::<T>())
    }
}

impl<T: 'static> Encode for Opaque<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::new(&self.0))
    }
}

/// Text written to the output as-is, e.g. a symbol name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verbatim<S>(pub S);

impl<S: AsRef<str>> Encode for Verbatim<S> {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::of::<Self>())
    }

    fn sexpression(&self) -> Option<String> {
        Some(self.0.as_ref().to_string())
    }
}

impl Encode for str {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl Encode for String {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl Encode for Cow<'_, str> {
    fn shape(&self) -> Shape<'_> {
        Shape::Str(self)
    }
}

impl Encode for char {
    fn shape(&self) -> Shape<'_> {
        // Rendered through `sexpression`; a `char` has no `&str` to lend.
        Shape::Unsupported(Unsupported::new(self))
    }

    fn sexpression(&self) -> Option<String> {
        let mut buf = [0u8; 4];
        let text = self.encode_utf8(&mut buf);
        Some(format!("\"{}\"", crate::escape::escape_lisp_string(text)))
    }
}

macro_rules! encode_signed {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn shape(&self) -> Shape<'_> {
                Shape::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! encode_unsigned {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn shape(&self) -> Shape<'_> {
                Shape::Uint(u64::from(*self))
            }
        }
    )*};
}

encode_signed!(i8, i16, i32, i64);
encode_unsigned!(u8, u16, u32, u64);

impl Encode for isize {
    fn shape(&self) -> Shape<'_> {
        Shape::Int(*self as i64)
    }
}

impl Encode for usize {
    fn shape(&self) -> Shape<'_> {
        Shape::Uint(*self as u64)
    }
}

impl Encode for i128 {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::with_detail(self))
    }
}

impl Encode for u128 {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::with_detail(self))
    }
}

impl Encode for f64 {
    fn shape(&self) -> Shape<'_> {
        if self.is_finite() {
            Shape::Float(*self)
        } else {
            Shape::Unsupported(Unsupported::with_detail(self))
        }
    }
}

impl Encode for f32 {
    fn shape(&self) -> Shape<'_> {
        if self.is_finite() {
            Shape::Float32(*self)
        } else {
            Shape::Unsupported(Unsupported::with_detail(self))
        }
    }
}

impl Encode for bool {
    fn shape(&self) -> Shape<'_> {
        Shape::Bool(*self)
    }
}

impl Encode for () {
    fn shape(&self) -> Shape<'_> {
        Shape::Unsupported(Unsupported::new(self))
    }
}

impl<T: Encode> Encode for [T] {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self.iter().map(|item| item as &dyn Encode).collect())
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn shape(&self) -> Shape<'_> {
        self.as_slice().shape()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn shape(&self) -> Shape<'_> {
        self.as_slice().shape()
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Sequence(self.iter().map(|item| item as &dyn Encode).collect())
    }
}

impl<K: Encode, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(
            self.iter()
                .map(|(key, value)| (key as &dyn Encode, value as &dyn Encode))
                .collect(),
        )
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn shape(&self) -> Shape<'_> {
        Shape::Map(
            self.iter()
                .map(|(key, value)| (key as &dyn Encode, value as &dyn Encode))
                .collect(),
        )
    }
}

impl<T: Encode> Encode for Option<T> {
    fn shape(&self) -> Shape<'_> {
        Shape::Ref(self.as_ref().map(|inner| inner as &dyn Encode))
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn shape(&self) -> Shape<'_> {
        (**self).shape()
    }

    fn sexpression(&self) -> Option<String> {
        (**self).sexpression()
    }
}

macro_rules! encode_pointer {
    ($($ptr:ident),*) => {$(
        impl<T: Encode + ?Sized> Encode for $ptr<T> {
            fn shape(&self) -> Shape<'_> {
                (**self).shape()
            }

            fn sexpression(&self) -> Option<String> {
                (**self).sexpression()
            }
        }
    )*};
}

encode_pointer!(Box, Rc, Arc);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_is_an_indirection() {
        assert!(matches!(None::<i32>.shape(), Shape::Ref(None)));
        assert!(matches!(Some(3).shape(), Shape::Ref(Some(_))));
    }

    #[test]
    fn wide_integers_are_unsupported() {
        match 7i128.shape() {
            Shape::Unsupported(info) => {
                assert_eq!(info.type_name(), "i128");
                assert_eq!(info.detail(), Some("7"));
            }
            _ => panic!("i128 should be unsupported"),
        }
    }

    #[test]
    fn opaque_values_are_lent_to_the_handler() {
        let wrapped = Opaque(5u8);
        match wrapped.shape() {
            Shape::Unsupported(info) => {
                assert_eq!(info.type_name(), "u8");
                assert_eq!(info.downcast_ref::<u8>(), Some(&5));
                assert_eq!(info.downcast_ref::<u16>(), None);
                assert!(info.detail().is_none());
            }
            _ => panic!("Opaque should be unsupported"),
        }

        match Verbatim("sym").shape() {
            Shape::Unsupported(info) => assert!(info.value().is_none()),
            _ => panic!("Verbatim has no structural shape"),
        }
    }

    #[test]
    fn non_finite_floats_are_unsupported() {
        assert!(matches!(f64::NAN.shape(), Shape::Unsupported(_)));
        assert!(matches!(f32::INFINITY.shape(), Shape::Unsupported(_)));
        assert!(matches!(1.5f64.shape(), Shape::Float(_)));
    }

    #[test]
    fn pointers_forward_custom_rendering() {
        let boxed: Box<Verbatim<&str>> = Box::new(Verbatim("sym"));
        assert_eq!(boxed.sexpression().as_deref(), Some("sym"));
    }
}
