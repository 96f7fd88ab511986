//! Record metadata: type names, field names and visibility.
//!
//! A [`RecordSchema`] is built once per type (typically in a `LazyLock` static,
//! see [`encode_record!`](crate::encode_record)) and resolves each field's
//! display name from its rename tag up front, so encoding never parses tags.

use super::shape::Encode;

/// Metadata for one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    ident: &'static str,
    tag: Option<&'static str>,
    exported: bool,
}

impl FieldDef {
    /// An exported field encoded under its declared name.
    pub const fn new(ident: &'static str) -> Self {
        Self {
            ident,
            tag: None,
            exported: true,
        }
    }

    /// A field that never participates in encoding.
    pub const fn hidden(ident: &'static str) -> Self {
        Self {
            ident,
            tag: None,
            exported: false,
        }
    }

    /// Attach a rename tag of the form `name[,options]`.
    ///
    /// Only the segment before the first comma is honoured; the rest is
    /// reserved and currently ignored. An empty name keeps the declared one.
    pub const fn tag(self, tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            ..self
        }
    }

    /// Whether the field participates in encoding.
    pub fn is_exported(&self) -> bool {
        self.exported
    }

    fn display_name(&self) -> &'static str {
        self.tag.and_then(tag_name).unwrap_or(self.ident)
    }
}

/// First comma-delimited segment of a rename tag, or `None` when it is empty.
pub fn tag_name(tag: &str) -> Option<&str> {
    let name = match tag.split_once(',') {
        Some((name, _options)) => name,
        None => tag,
    };
    (!name.is_empty()).then_some(name)
}

/// A field with its display name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Name written into `(<name> <value>)` entries.
    pub name: &'static str,
    /// Whether the field participates in encoding.
    pub exported: bool,
}

/// Per-type table of field metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: Option<&'static str>,
    fields: Vec<ResolvedField>,
}

impl RecordSchema {
    /// Schema for a named record type; `name` appears in the `(struct <name>)` header.
    pub fn new(name: &'static str, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self::build(Some(name), fields)
    }

    /// Schema for a record type without a name; no header is emitted.
    pub fn anonymous(fields: impl IntoIterator<Item = FieldDef>) -> Self {
        Self::build(None, fields)
    }

    fn build(name: Option<&'static str>, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        let fields = fields
            .into_iter()
            .map(|def| ResolvedField {
                name: def.display_name(),
                exported: def.is_exported(),
            })
            .collect();
        Self { name, fields }
    }

    /// Record type name, if any.
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }
}

/// A record value: its schema plus one value per schema field.
pub struct Record<'a> {
    schema: &'a RecordSchema,
    values: Vec<&'a dyn Encode>,
}

impl<'a> Record<'a> {
    /// Pair a schema with field values given in declaration order.
    ///
    /// Values of hidden fields are never looked at; pass anything, e.g. `&()`.
    ///
    /// # Panics
    ///
    /// If the number of values differs from the number of schema fields.
    pub fn new(schema: &'a RecordSchema, values: &[&'a dyn Encode]) -> Self {
        assert_eq!(
            schema.fields.len(),
            values.len(),
            "record value count must match its schema"
        );
        Self {
            schema,
            values: values.to_vec(),
        }
    }

    /// Record type name, if any.
    pub fn type_name(&self) -> Option<&'static str> {
        self.schema.name
    }

    /// Exported fields with their display names, in declaration order.
    pub fn exported_fields(&self) -> impl Iterator<Item = (&'static str, &'a dyn Encode)> + '_ {
        self.schema
            .fields
            .iter()
            .zip(self.values.iter().copied())
            .filter(|(field, _)| field.exported)
            .map(|(field, value)| (field.name, value))
    }
}

/// Implement [`Encode`] for a struct by listing its exported fields.
///
/// Each field may carry a rename tag; fields not listed are treated as hidden.
///
/// ```
/// use sxencode::encode_record;
///
/// struct Point {
///     x: i32,
///     y: i32,
///     label: String,
/// }
///
/// encode_record!(Point { x, y, label = "name,omitempty" });
///
/// let point = Point { x: 1, y: 2, label: "origin".into() };
/// assert_eq!(
///     sxencode::to_string(&point).unwrap(),
///     r#"((struct Point)(x 1)(y 2)(name "origin"))"#
/// );
/// ```
#[macro_export]
macro_rules! encode_record {
    ($ty:ident { $($field:ident $(= $tag:literal)?),* $(,)? }) => {
        impl $crate::Encode for $ty {
            fn shape(&self) -> $crate::Shape<'_> {
                static SCHEMA: ::std::sync::LazyLock<$crate::RecordSchema> =
                    ::std::sync::LazyLock::new(|| {
                        $crate::RecordSchema::new(
                            stringify!($ty),
                            [$($crate::FieldDef::new(stringify!($field)) $(.tag($tag))?),*],
                        )
                    });
                $crate::Shape::Record($crate::Record::new(
                    &SCHEMA,
                    &[$(&self.$field as &dyn $crate::Encode),*],
                ))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_name_takes_first_segment() {
        assert_eq!(tag_name("bar"), Some("bar"));
        assert_eq!(tag_name("bar,omitempty"), Some("bar"));
        assert_eq!(tag_name(",omitempty"), None);
        assert_eq!(tag_name(""), None);
    }

    #[test]
    fn empty_tag_keeps_declared_name() {
        let schema = RecordSchema::anonymous([
            FieldDef::new("Count").tag(",omitempty"),
            FieldDef::new("Size").tag(""),
        ]);
        let names: Vec<_> = schema.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Count", "Size"]);
    }

    #[test]
    #[should_panic(expected = "record value count must match its schema")]
    fn value_count_mismatch_panics() {
        let schema = RecordSchema::anonymous([FieldDef::new("a"), FieldDef::new("b")]);
        let a = 1;
        let _ = Record::new(&schema, &[&a]);
    }

    #[test]
    fn schema_resolves_names_once() {
        let schema = RecordSchema::new(
            "Foo",
            [
                FieldDef::new("Bar"),
                FieldDef::new("Baz").tag("baz,extra"),
                FieldDef::hidden("secret"),
            ],
        );
        let names: Vec<_> = schema.fields().iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Bar", "baz", "secret"]);
        assert!(!schema.fields()[2].exported);
    }

    #[test]
    fn hidden_fields_are_not_yielded() {
        let schema = RecordSchema::anonymous([FieldDef::new("a"), FieldDef::hidden("b")]);
        let a = 1;
        let record = Record::new(&schema, &[&a, &()]);
        let names: Vec<_> = record.exported_fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(record.type_name(), None);
    }
}
