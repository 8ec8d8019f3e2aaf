//! Delimited text stream codec.
//!
//! Scalars are written as tokens joined by the token separator, and every
//! record ends with the block separator. Choice selectors are written as the
//! selected item's name and inline array sizes as a decimal integer token.
//! Either separator may be longer than one byte.

use std::collections::VecDeque;
use std::io::{self, BufReader, Read, Write};

use swe_common::value::{format_double, parse_double};
use swe_common::{DataComponent, DataType, TextEncoding, Value};

use crate::error::{CodecError, CodecResult};
use crate::walk::{TokenReader, TokenWriter};

/// What ended the most recently read token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Token,
    Block,
    End,
}

/// Byte input with an unbounded lookahead for separator matching.
struct ByteStream<R: Read> {
    input: BufReader<R>,
    lookahead: VecDeque<u8>,
    offset: u64,
}

impl<R: Read> ByteStream<R> {
    fn new(input: R) -> Self {
        Self {
            input: BufReader::new(input),
            lookahead: VecDeque::new(),
            offset: 0,
        }
    }

    fn fill(&mut self, n: usize) -> CodecResult<()> {
        let mut byte = [0u8; 1];
        while self.lookahead.len() < n {
            match self.input.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => self.lookahead.push_back(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> CodecResult<Option<u8>> {
        self.fill(1)?;
        Ok(self.lookahead.front().copied())
    }

    fn starts_with(&mut self, pattern: &[u8]) -> CodecResult<bool> {
        if pattern.is_empty() {
            return Ok(false);
        }
        self.fill(pattern.len())?;
        Ok(self.lookahead.len() >= pattern.len()
            && self.lookahead.iter().zip(pattern).all(|(a, b)| a == b))
    }

    fn advance(&mut self, n: usize) {
        let n = n.min(self.lookahead.len());
        self.lookahead.drain(..n);
        self.offset += n as u64;
    }

    fn next(&mut self) -> CodecResult<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.advance(1);
        }
        Ok(byte)
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Token reader over a delimited text stream.
pub struct TextReader<R: Read> {
    stream: ByteStream<R>,
    token_separator: Vec<u8>,
    block_separator: Vec<u8>,
    decimal_separator: char,
    collapse_white_space: bool,
    max_token_length: usize,
    last: Delimiter,
}

impl<R: Read> TextReader<R> {
    pub fn new(input: R, encoding: &TextEncoding, max_token_length: usize) -> Self {
        Self {
            stream: ByteStream::new(input),
            token_separator: encoding.token_separator.as_bytes().to_vec(),
            block_separator: encoding.block_separator.as_bytes().to_vec(),
            decimal_separator: encoding.decimal_separator,
            collapse_white_space: encoding.collapse_white_space,
            max_token_length,
            last: Delimiter::Block,
        }
    }

    /// Whether the reader sits between two records.
    pub fn at_record_boundary(&self) -> bool {
        self.last != Delimiter::Token
    }

    /// Skip the rest of the current record.
    ///
    /// Does nothing when the reader already sits between records.
    pub fn resync(&mut self) -> CodecResult<()> {
        while self.last == Delimiter::Token {
            if self.stream.starts_with(&self.block_separator)? {
                self.stream.advance(self.block_separator.len());
                self.last = Delimiter::Block;
            } else if self.stream.next()?.is_none() {
                self.last = Delimiter::End;
            }
        }
        Ok(())
    }

    /// Skip whitespace that does not start the block separator.
    fn skip_white_space(&mut self) -> CodecResult<()> {
        if !self.collapse_white_space {
            return Ok(());
        }
        while let Some(byte) = self.stream.peek()? {
            if !byte.is_ascii_whitespace() || self.stream.starts_with(&self.block_separator)? {
                break;
            }
            self.stream.advance(1);
        }
        Ok(())
    }

    fn next_token(&mut self, path: &str) -> CodecResult<String> {
        if self.last != Delimiter::Token {
            return Err(CodecError::parse(
                self.stream.offset,
                format!("record ended before '{}'", path),
            ));
        }
        self.skip_white_space()?;
        let start = self.stream.offset;
        let mut bytes = Vec::new();
        loop {
            if self.stream.starts_with(&self.block_separator)? {
                self.stream.advance(self.block_separator.len());
                self.last = Delimiter::Block;
                break;
            }
            if self.stream.starts_with(&self.token_separator)? {
                self.stream.advance(self.token_separator.len());
                self.last = Delimiter::Token;
                break;
            }
            match self.stream.next()? {
                Some(byte) => bytes.push(byte),
                None => {
                    if bytes.is_empty() {
                        return Err(CodecError::Truncated { offset: start });
                    }
                    self.last = Delimiter::End;
                    break;
                }
            }
            if bytes.len() > self.max_token_length {
                return Err(CodecError::parse(
                    start,
                    format!("token for '{}' exceeds {} bytes", path, self.max_token_length),
                ));
            }
        }

        let token = String::from_utf8(bytes).map_err(|e| CodecError::parse(start, e.to_string()))?;
        Ok(if self.collapse_white_space {
            token.trim().to_string()
        } else {
            token
        })
    }

    fn numeric(&self, token: String) -> String {
        if self.decimal_separator == '.' {
            token
        } else {
            token.replace(self.decimal_separator, ".")
        }
    }
}

impl<R: Read> TokenReader for TextReader<R> {
    fn offset(&self) -> u64 {
        self.stream.offset
    }

    fn begin_record(&mut self) -> CodecResult<bool> {
        // a bare block separator is a record whose only token is empty
        self.skip_white_space()?;
        if self.stream.peek()?.is_none() {
            return Ok(false);
        }
        self.last = Delimiter::Token;
        Ok(true)
    }

    fn end_record(&mut self) -> CodecResult<()> {
        if self.last != Delimiter::Token {
            return Ok(());
        }
        // a trailing token separator is tolerated before the block separator
        self.skip_white_space()?;
        if self.stream.starts_with(&self.token_separator)? {
            self.stream.advance(self.token_separator.len());
            self.skip_white_space()?;
        }
        if self.stream.starts_with(&self.block_separator)? {
            self.stream.advance(self.block_separator.len());
            self.last = Delimiter::Block;
            return Ok(());
        }
        if self.stream.peek()?.is_none() {
            self.last = Delimiter::End;
            return Ok(());
        }
        Err(CodecError::parse(
            self.stream.offset,
            "unexpected tokens after the end of the record",
        ))
    }

    fn read_scalar(&mut self, path: &str, data_type: DataType) -> CodecResult<Value> {
        let token = self.next_token(path)?;
        Ok(match data_type {
            DataType::Float | DataType::Double => Value::Text(self.numeric(token)),
            DataType::Instant | DataType::DateTime => {
                let numeric = self.numeric(token.clone());
                match parse_double(&numeric) {
                    Some(seconds) => Value::Double(seconds),
                    None => Value::Text(token),
                }
            }
            _ => Value::Text(token),
        })
    }

    fn read_count(&mut self, path: &str) -> CodecResult<i64> {
        let offset = self.stream.offset;
        let token = self.next_token(path)?;
        token.parse::<i64>().map_err(|_| {
            CodecError::parse(offset, format!("array size '{}' for '{}' is not an integer", token, path))
        })
    }

    fn read_choice(&mut self, path: &str, items: &[DataComponent]) -> CodecResult<i64> {
        let offset = self.stream.offset;
        let token = self.next_token(path)?;
        if let Some(index) = items.iter().position(|item| item.name() == token) {
            return Ok(index as i64);
        }
        token.parse::<i64>().map_err(|_| {
            CodecError::parse(offset, format!("'{}' is not an item of choice '{}'", token, path))
        })
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Token writer producing a delimited text stream.
pub struct TextWriter<W: Write> {
    output: W,
    token_separator: String,
    block_separator: String,
    decimal_separator: char,
    decimal_places: Option<usize>,
    first_token: bool,
}

impl<W: Write> TextWriter<W> {
    pub fn new(output: W, encoding: &TextEncoding) -> Self {
        Self {
            output,
            token_separator: encoding.token_separator.clone(),
            block_separator: encoding.block_separator.clone(),
            decimal_separator: encoding.decimal_separator,
            decimal_places: encoding.decimal_places,
            first_token: true,
        }
    }

    pub fn finish(mut self) -> CodecResult<W> {
        self.output.flush()?;
        Ok(self.output)
    }

    fn token(&mut self, path: &str, text: &str) -> CodecResult<()> {
        if text.contains(self.token_separator.as_str()) || text.contains(self.block_separator.as_str()) {
            return Err(CodecError::write(format!(
                "'{}': value '{}' contains a separator",
                path, text
            )));
        }
        if !self.first_token {
            self.output.write_all(self.token_separator.as_bytes())?;
        }
        self.output.write_all(text.as_bytes())?;
        self.first_token = false;
        Ok(())
    }

    fn format_number(&self, value: &Value) -> Option<String> {
        let v = match value {
            Value::Float(_) | Value::Double(_) => value.as_double().ok()?,
            _ => return None,
        };
        let text = match self.decimal_places {
            Some(places) if v.is_finite() => format!("{:.*}", places, v),
            _ => match value {
                Value::Float(f) => Value::Float(*f).as_text(),
                _ => format_double(v),
            },
        };
        Some(if self.decimal_separator == '.' {
            text
        } else {
            text.replace('.', &self.decimal_separator.to_string())
        })
    }
}

impl<W: Write> TokenWriter for TextWriter<W> {
    fn begin_record(&mut self) -> CodecResult<()> {
        self.first_token = true;
        Ok(())
    }

    fn end_record(&mut self) -> CodecResult<()> {
        self.output.write_all(self.block_separator.as_bytes())?;
        Ok(())
    }

    fn write_scalar(&mut self, path: &str, _data_type: DataType, value: &Value) -> CodecResult<()> {
        let text = self.format_number(value).unwrap_or_else(|| value.as_text());
        self.token(path, &text)
    }

    fn write_count(&mut self, path: &str, count: usize) -> CodecResult<()> {
        self.token(path, &count.to_string())
    }

    fn write_choice(&mut self, path: &str, _index: usize, item: &str) -> CodecResult<()> {
        self.token(path, item)
    }
}
