//! Value-to-S-expression encoder
//!
//! The [`Encoder`] walks any value implementing [`Encode`], dispatching on its
//! [`Shape`], and writes the textual form to an [`io::Write`] sink. Records and
//! maps render each member into a scratch buffer first so that members whose
//! encoding comes out empty can be dropped without leaving stray parentheses.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{ConfigError, EncodeError, EncodeResult};
use crate::escape::escape_lisp_string;

pub mod json;
pub mod record;
pub mod shape;

pub use record::{FieldDef, Record, RecordSchema, ResolvedField, tag_name};
pub use shape::{Encode, Opaque, Shape, Unsupported, Verbatim};

/// Literal written for sequence elements whose encoding is empty.
pub const EMPTY_LIST: &str = "nil";

/// Caller-supplied rendering for values the encoder cannot classify.
pub type FallbackHandler = Arc<dyn Fn(&Unsupported<'_>) -> anyhow::Result<String> + Send + Sync>;

/// Serializable encoder options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Token that opens a vector (default: `#(`)
    pub vector_open: String,

    /// Emit a `(struct <Name>)` header inside named records
    pub struct_header: bool,

    /// Maximum nesting depth before encoding is aborted (`None` disables the check)
    pub max_depth: Option<usize>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            vector_open: "#(".to_string(),
            struct_header: true,
            max_depth: Some(512),
        }
    }
}

impl EncoderConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// Renders values as S-expression text.
///
/// An encoder is immutable once built, so one instance can serve any number of
/// encodes, including concurrent ones writing to different sinks.
#[derive(Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
    fallback: Option<FallbackHandler>,
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl Encoder {
    /// Create an encoder with the given configuration and no fallback handler.
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            fallback: None,
        }
    }

    /// Install a handler for unsupported values.
    ///
    /// Without one, unsupported values produce no output at all.
    pub fn with_fallback<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Unsupported<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    /// Get the current configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Write the encoding of `value` to `sink`.
    ///
    /// On error the sink may already hold a partial, unparseable prefix.
    pub fn encode<T, W>(&self, value: &T, sink: &mut W) -> EncodeResult<()>
    where
        T: Encode + ?Sized,
        W: Write,
    {
        self.write_value(&value, sink, 0)
    }

    /// Encode `value` into a fresh byte buffer.
    pub fn to_vec<T: Encode + ?Sized>(&self, value: &T) -> EncodeResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.encode(value, &mut buf)?;
        Ok(buf)
    }

    /// Encode `value` into a `String`.
    pub fn to_string<T: Encode + ?Sized>(&self, value: &T) -> EncodeResult<String> {
        let buf = self.to_vec(value)?;
        String::from_utf8(buf)
            .map_err(|err| EncodeError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    fn write_value(&self, value: &dyn Encode, out: &mut dyn Write, depth: usize) -> EncodeResult<()> {
        if let Some(limit) = self.config.max_depth {
            if depth > limit {
                return Err(EncodeError::DepthExceeded { limit });
            }
        }

        if let Some(text) = value.sexpression() {
            out.write_all(text.as_bytes())?;
            return Ok(());
        }

        match value.shape() {
            Shape::Record(record) => self.write_record(&record, out, depth)?,
            Shape::Sequence(items) => self.write_sequence(&items, out, depth)?,
            Shape::Map(entries) => self.write_map(&entries, out, depth)?,
            Shape::Str(text) => {
                out.write_all(b"\"")?;
                out.write_all(escape_lisp_string(text).as_bytes())?;
                out.write_all(b"\"")?;
            }
            Shape::Int(num) => write!(out, "{}", num)?,
            Shape::Uint(num) => write!(out, "{}", num)?,
            // Debug formatting keeps the decimal point on integral floats.
            Shape::Float(num) => write!(out, "{:?}", num)?,
            Shape::Float32(num) => write!(out, "{:?}", num)?,
            Shape::Bool(true) => out.write_all(b"t")?,
            Shape::Bool(false) => out.write_all(EMPTY_LIST.as_bytes())?,
            Shape::Ref(Some(inner)) => self.write_value(inner, out, depth + 1)?,
            Shape::Ref(None) => {}
            Shape::Unsupported(info) => self.write_unsupported(&info, out)?,
        }
        Ok(())
    }

    /// Render `value` on its own so the caller can decide whether to keep it.
    fn fragment(&self, value: &dyn Encode, depth: usize) -> EncodeResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_value(value, &mut buf, depth)?;
        Ok(buf)
    }

    fn write_record(&self, record: &Record<'_>, out: &mut dyn Write, depth: usize) -> EncodeResult<()> {
        out.write_all(b"(")?;
        if self.config.struct_header {
            if let Some(name) = record.type_name() {
                write!(out, "(struct {})", name)?;
            }
        }
        for (name, value) in record.exported_fields() {
            let fragment = self.fragment(value, depth + 1)?;
            if fragment.is_empty() {
                trace!(field = name, "omitting record field with empty encoding");
                continue;
            }
            write!(out, "({} ", name)?;
            out.write_all(&fragment)?;
            out.write_all(b")")?;
        }
        out.write_all(b")")?;
        Ok(())
    }

    fn write_sequence(&self, items: &[&dyn Encode], out: &mut dyn Write, depth: usize) -> EncodeResult<()> {
        out.write_all(self.config.vector_open.as_bytes())?;
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                out.write_all(b" ")?;
            }
            let fragment = self.fragment(*item, depth + 1)?;
            if fragment.is_empty() {
                out.write_all(EMPTY_LIST.as_bytes())?;
            } else {
                out.write_all(&fragment)?;
            }
        }
        out.write_all(b")")?;
        Ok(())
    }

    fn write_map(
        &self,
        entries: &[(&dyn Encode, &dyn Encode)],
        out: &mut dyn Write,
        depth: usize,
    ) -> EncodeResult<()> {
        out.write_all(b"(")?;
        for (key, value) in entries {
            let key = self.fragment(*key, depth + 1)?;
            let value = self.fragment(*value, depth + 1)?;
            if key.is_empty() || value.is_empty() {
                trace!("omitting map entry with empty key or value");
                continue;
            }
            out.write_all(b"(")?;
            out.write_all(&key)?;
            out.write_all(b" ")?;
            out.write_all(&value)?;
            out.write_all(b")")?;
        }
        out.write_all(b")")?;
        Ok(())
    }

    fn write_unsupported(&self, info: &Unsupported<'_>, out: &mut dyn Write) -> EncodeResult<()> {
        let Some(handler) = &self.fallback else {
            return Ok(());
        };
        debug!(type_name = info.type_name(), "invoking fallback handler");
        let text = handler(info).map_err(|source| EncodeError::Fallback {
            type_name: info.type_name(),
            source,
        })?;
        out.write_all(text.as_bytes())?;
        Ok(())
    }
}

/// Write the encoding of `value` to `sink` using the default configuration.
pub fn to_writer<T, W>(value: &T, sink: &mut W) -> EncodeResult<()>
where
    T: Encode + ?Sized,
    W: Write,
{
    Encoder::default().encode(value, sink)
}

/// Encode `value` into a byte buffer using the default configuration.
pub fn to_vec<T: Encode + ?Sized>(value: &T) -> EncodeResult<Vec<u8>> {
    Encoder::default().to_vec(value)
}

/// Encode `value` into a `String` using the default configuration.
pub fn to_string<T: Encode + ?Sized>(value: &T) -> EncodeResult<String> {
    Encoder::default().to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn primitives() {
        assert_eq!(to_string("a\"b").unwrap(), r#""a\"b""#);
        assert_eq!(to_string(&-42i32).unwrap(), "-42");
        assert_eq!(to_string(&42u64).unwrap(), "42");
        assert_eq!(to_string(&0.1f64).unwrap(), "0.1");
        assert_eq!(to_string(&1.0f64).unwrap(), "1.0");
        assert_eq!(to_string(&0.1f32).unwrap(), "0.1");
        assert_eq!(to_string(&true).unwrap(), "t");
        assert_eq!(to_string(&false).unwrap(), "nil");
        assert_eq!(to_string(&'q').unwrap(), "\"q\"");
    }

    #[test]
    fn absent_reference_is_empty() {
        assert_eq!(to_string(&None::<i32>).unwrap(), "");
        assert_eq!(to_string(&Some(Box::new(5))).unwrap(), "5");
    }

    #[test]
    fn custom_vector_marker() {
        let config = EncoderConfig {
            vector_open: "[".to_string(),
            ..EncoderConfig::default()
        };
        let encoder = Encoder::new(config);
        assert_eq!(encoder.to_string(&vec![1, 2]).unwrap(), "[1 2)");
    }

    #[test]
    fn sink_failure_propagates() {
        let err = to_writer(&vec![1, 2, 3], &mut FailingSink).unwrap_err();
        assert!(matches!(err, EncodeError::Io(_)));
    }

    #[test]
    fn fallback_failure_propagates() {
        let encoder = Encoder::default().with_fallback(|info| {
            anyhow::bail!("cannot render {}", info.type_name())
        });
        let err = encoder.to_string(&vec![Opaque(())]).unwrap_err();
        match err {
            EncodeError::Fallback { type_name, source } => {
                assert_eq!(type_name, "()");
                assert_eq!(source.to_string(), "cannot render ()");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = EncoderConfig {
            max_depth: Some(2),
            ..EncoderConfig::default()
        };
        let encoder = Encoder::new(config);
        assert!(encoder.to_string(&vec![vec![1]]).is_ok());
        let err = encoder.to_string(&vec![vec![vec![1]]]).unwrap_err();
        assert!(matches!(err, EncodeError::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn config_loads_with_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sxencode.json");
        fs::write(&path, r#"{"vector_open": "["}"#).unwrap();

        let config = EncoderConfig::load(&path).unwrap();
        assert_eq!(config.vector_open, "[");
        assert!(config.struct_header);
        assert_eq!(config.max_depth, Some(512));
    }

    #[test]
    fn missing_config_reports_path() {
        let temp = TempDir::new().unwrap();
        let err = EncoderConfig::load(temp.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
