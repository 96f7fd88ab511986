//! Reader that turns S-expression text into nodes via [`Construct`] callbacks.
//!
//! The reader owns the scanning loop; node assembly is left entirely to the
//! builder, so the same reader can produce [`Sexpr`] trees or any other model.

use num_bigint::BigInt;
use tracing::debug;

use crate::error::{ReadError, ReadResult};
use crate::escape::unescape_lisp_string;
use crate::sexpr::{Construct, Sexpr, SexprBuilder};

/// Nesting limit used by [`read_all`] and [`read_one`], matching the
/// encoder's default.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Read every form in `source`.
pub fn read_all<C: Construct>(source: &str, builder: &C) -> ReadResult<Vec<C::Node>> {
    read_all_with_limit(source, builder, DEFAULT_MAX_DEPTH)
}

/// Read every form in `source`, failing with [`ReadError::DepthExceeded`]
/// once forms nest deeper than `max_depth`.
pub fn read_all_with_limit<C: Construct>(
    source: &str,
    builder: &C,
    max_depth: usize,
) -> ReadResult<Vec<C::Node>> {
    let mut reader = Reader::new(source, builder, max_depth);
    let mut forms = Vec::new();
    loop {
        reader.skip_ws();
        if reader.eof() {
            break;
        }
        forms.push(reader.parse_expr()?);
    }
    debug!(forms = forms.len(), bytes = source.len(), "read S-expression document");
    Ok(forms)
}

/// Read exactly one form; trailing forms are an error.
pub fn read_one<C: Construct>(source: &str, builder: &C) -> ReadResult<C::Node> {
    read_one_with_limit(source, builder, DEFAULT_MAX_DEPTH)
}

/// Like [`read_one`] with an explicit nesting limit.
pub fn read_one_with_limit<C: Construct>(
    source: &str,
    builder: &C,
    max_depth: usize,
) -> ReadResult<C::Node> {
    let mut reader = Reader::new(source, builder, max_depth);
    let node = reader.parse_expr()?;
    reader.skip_ws();
    if !reader.eof() {
        return Err(reader.error("unexpected trailing input"));
    }
    Ok(node)
}

/// Read every form in `source` into [`Sexpr`] trees.
pub fn parse(source: &str) -> ReadResult<Vec<Sexpr>> {
    read_all(source, &SexprBuilder)
}

struct Reader<'a, C> {
    src: &'a str,
    bytes: &'a [u8],
    index: usize,
    builder: &'a C,
    depth: usize,
    max_depth: usize,
}

impl<'a, C: Construct> Reader<'a, C> {
    fn new(src: &'a str, builder: &'a C, max_depth: usize) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            index: 0,
            builder,
            depth: 0,
            max_depth,
        }
    }

    fn eof(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.index).copied()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.index + 1).copied()
    }

    fn advance(&mut self) {
        if self.index < self.bytes.len() {
            self.index += 1;
        }
    }

    fn skip_ws(&mut self) {
        loop {
            while let Some(ch) = self.current() {
                if ch.is_ascii_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.current() == Some(b';') {
                while let Some(ch) = self.current() {
                    self.advance();
                    if ch == b'\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    /// Enter one nesting level; every recursive descent goes through here.
    fn descend(&mut self) -> ReadResult<()> {
        if self.depth >= self.max_depth {
            return Err(ReadError::DepthExceeded {
                limit: self.max_depth,
                offset: self.index,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_expr(&mut self) -> ReadResult<C::Node> {
        self.descend()?;
        let node = self.parse_form();
        self.depth -= 1;
        node
    }

    fn parse_form(&mut self) -> ReadResult<C::Node> {
        self.skip_ws();
        let Some(ch) = self.current() else {
            return Err(self.eof_error());
        };

        match ch {
            b'(' => {
                self.advance();
                self.parse_list_tail()
            }
            b')' => Err(self.error("unexpected ')'")),
            b'"' => self.parse_string(),
            b'\'' => {
                self.advance();
                let quoted = self.parse_expr()?;
                let b = self.builder;
                let tail = b.cons(quoted, b.null());
                Ok(b.cons(b.symbol("quote".to_string()), tail))
            }
            b'#' => self.parse_dispatch(),
            b':' => self.parse_keyword(),
            _ => self.parse_atom(),
        }
    }

    /// Parse list elements after the opening parenthesis.
    fn parse_list_tail(&mut self) -> ReadResult<C::Node> {
        let mut items = Vec::new();
        let mut tail = None;
        loop {
            self.skip_ws();
            match self.current() {
                None => return Err(self.eof_error()),
                Some(b')') => {
                    self.advance();
                    break;
                }
                Some(b'.') if self.peek().is_none_or(is_delimiter) => {
                    if items.is_empty() {
                        return Err(self.error("dotted pair without a head"));
                    }
                    self.advance();
                    tail = Some(self.parse_expr()?);
                    self.skip_ws();
                    if self.current() != Some(b')') {
                        return Err(self.error("expected ')' after dotted tail"));
                    }
                    self.advance();
                    break;
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }

        let b = self.builder;
        let end = match tail {
            Some(node) => node,
            None => b.null(),
        };
        Ok(items.into_iter().rev().fold(end, |cdr, car| b.cons(car, cdr)))
    }

    fn parse_string(&mut self) -> ReadResult<C::Node> {
        // consume opening quote
        self.advance();
        let src = self.src;
        let start = self.index;
        while let Some(ch) = self.current() {
            match ch {
                b'"' => {
                    let raw = &src[start..self.index];
                    self.advance();
                    let text = unescape_lisp_string(raw)
                        .ok_or_else(|| self.error("incomplete escape"))?;
                    return Ok(self.builder.string(text));
                }
                b'\\' => {
                    self.advance();
                    self.advance();
                }
                _ => self.advance(),
            }
        }
        Err(self.eof_error())
    }

    fn parse_dispatch(&mut self) -> ReadResult<C::Node> {
        // consume '#'
        self.advance();
        match self.current() {
            Some(b'(') => {
                self.advance();
                let items = self.parse_sequence()?;
                let len = items.len();
                Ok(self.builder.array(items, vec![len]))
            }
            Some(b'\\') => {
                self.advance();
                self.parse_character()
            }
            Some(b'0'..=b'9') => self.parse_multi_array(),
            Some(_) => Err(self.error("unknown dispatch character after '#'")),
            None => Err(self.eof_error()),
        }
    }

    /// Parse elements up to the closing parenthesis, without consing them.
    fn parse_sequence(&mut self) -> ReadResult<Vec<C::Node>> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.current() {
                None => return Err(self.eof_error()),
                Some(b')') => {
                    self.advance();
                    return Ok(items);
                }
                Some(_) => items.push(self.parse_expr()?),
            }
        }
    }

    fn parse_multi_array(&mut self) -> ReadResult<C::Node> {
        let start = self.index;
        while matches!(self.current(), Some(b'0'..=b'9')) {
            self.advance();
        }
        let rank: usize = self.src[start..self.index]
            .parse()
            .map_err(|_| self.error("invalid array rank"))?;
        if !matches!(self.current(), Some(b'A' | b'a')) {
            return Err(self.error("expected 'A' after array rank"));
        }
        self.advance();
        // each rank is one nesting level, plus one for the elements
        if rank >= self.max_depth.saturating_sub(self.depth) {
            return Err(ReadError::DepthExceeded {
                limit: self.max_depth,
                offset: start,
            });
        }

        let mut items = Vec::new();
        let dims = self.parse_array_level(rank, &mut items)?;
        Ok(self.builder.array(items, dims))
    }

    /// Parse one nesting level of a `#nA` literal and return its dimensions.
    fn parse_array_level(&mut self, rank: usize, items: &mut Vec<C::Node>) -> ReadResult<Vec<usize>> {
        if rank == 0 {
            items.push(self.parse_expr()?);
            return Ok(Vec::new());
        }

        self.descend()?;
        let dims = self.parse_array_rows(rank, items);
        self.depth -= 1;
        dims
    }

    fn parse_array_rows(&mut self, rank: usize, items: &mut Vec<C::Node>) -> ReadResult<Vec<usize>> {
        self.skip_ws();
        if self.current() != Some(b'(') {
            return Err(self.error("expected '(' in array literal"));
        }
        self.advance();

        let mut count = 0;
        let mut inner: Option<Vec<usize>> = None;
        loop {
            self.skip_ws();
            match self.current() {
                None => return Err(self.eof_error()),
                Some(b')') => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    let dims = self.parse_array_level(rank - 1, items)?;
                    if inner.as_ref().is_some_and(|seen| *seen != dims) {
                        return Err(self.error("ragged array literal"));
                    }
                    inner = Some(dims);
                    count += 1;
                }
            }
        }

        let mut dims = vec![count];
        dims.extend(inner.unwrap_or_else(|| vec![0; rank - 1]));
        Ok(dims)
    }

    fn parse_character(&mut self) -> ReadResult<C::Node> {
        let src = self.src;
        let rest = &src[self.index..];
        let Some(first) = rest.chars().next() else {
            return Err(self.eof_error());
        };
        let mut end = first.len_utf8();
        for ch in rest[end..].chars() {
            if ch.is_ascii() && is_delimiter(ch as u8) {
                break;
            }
            end += ch.len_utf8();
        }
        let token = &rest[..end];

        let value = if end == first.len_utf8() {
            first
        } else {
            match token.to_ascii_lowercase().as_str() {
                "space" => ' ',
                "newline" => '\n',
                "tab" => '\t',
                "return" => '\r',
                _ => return Err(self.error(&format!("unknown character name: {}", token))),
            }
        };
        self.index += end;
        Ok(self.builder.character(value))
    }

    fn parse_keyword(&mut self) -> ReadResult<C::Node> {
        self.advance(); // consume ':'
        let token = self.take_token();
        if token.is_empty() {
            return Err(self.error("empty keyword"));
        }
        Ok(self.builder.keyword(token.to_string()))
    }

    fn parse_atom(&mut self) -> ReadResult<C::Node> {
        let token = self.take_token();
        if token.is_empty() {
            return Err(self.error("unexpected character"));
        }

        let b = self.builder;
        match token {
            "nil" => return Ok(b.null()),
            "t" => return Ok(b.t()),
            _ => {}
        }

        if is_integer(token) {
            let digits = token.strip_prefix('+').unwrap_or(token);
            if let Ok(value) = digits.parse::<i64>() {
                return Ok(b.int(value));
            }
            return match digits.parse::<BigInt>() {
                Ok(value) => Ok(b.big_int(value)),
                Err(_) => Err(self.error("invalid integer literal")),
            };
        }

        if looks_numeric(token) {
            if let Ok(value) = token.parse::<f64>() {
                return Ok(b.float(value));
            }
        }

        Ok(b.symbol(token.to_string()))
    }

    fn take_token(&mut self) -> &'a str {
        let src = self.src;
        let start = self.index;
        while let Some(ch) = self.current() {
            if is_delimiter(ch) {
                break;
            }
            self.advance();
        }
        &src[start..self.index]
    }

    fn error(&self, message: &str) -> ReadError {
        ReadError::Syntax {
            message: message.to_string(),
            offset: self.index,
        }
    }

    fn eof_error(&self) -> ReadError {
        ReadError::UnexpectedEof { offset: self.index }
    }
}

fn is_delimiter(ch: u8) -> bool {
    match ch {
        b'(' | b')' | b'"' | b';' | b'\'' => true,
        c => c.is_ascii_whitespace(),
    }
}

fn is_integer(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric tokens start with a digit, or a sign or dot followed by a digit.
/// This keeps `inf`, `nan` and symbols like `-` out of float parsing.
fn looks_numeric(token: &str) -> bool {
    let bytes = token.as_bytes();
    match bytes {
        [first, ..] if first.is_ascii_digit() => true,
        [b'+' | b'-', b'.', next, ..] => next.is_ascii_digit(),
        [b'+' | b'-' | b'.', next, ..] => next.is_ascii_digit(),
        _ => false,
    }
}
