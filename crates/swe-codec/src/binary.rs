//! Binary stream codec.
//!
//! Each scalar is a fixed-width value (or a length-prefixed UTF-8 string)
//! laid out as declared by the encoding's member entries. Scalars without a
//! member entry use the default wire type for their storage kind. Choice
//! selectors are one unsigned byte and inline array sizes a signed 32-bit
//! integer in the stream byte order.
//!
//! A binary stream carries no record delimiters, so after a parse error the
//! reader has no way to find the next record. When the encoding declares a
//! byte length the stream ends there, and a record cut off by that limit is
//! truncated.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};

use base64::engine::general_purpose::{GeneralPurpose, STANDARD};
use base64::read::DecoderReader;
use base64::write::EncoderWriter;
use swe_common::{
    BinaryDataType, BinaryEncoding, ByteEncoding, ByteOrder, DataComponent, DataType, Value,
};

use crate::error::{CodecError, CodecResult};
use crate::walk::{TokenReader, TokenWriter};

/// Wire type and byte order per member reference.
#[derive(Debug, Clone)]
struct MemberLayout {
    members: HashMap<String, (BinaryDataType, ByteOrder)>,
    byte_order: ByteOrder,
}

impl MemberLayout {
    fn new(encoding: &BinaryEncoding) -> Self {
        let members = encoding
            .members
            .iter()
            .map(|m| {
                (
                    m.reference.trim_matches('/').to_string(),
                    (m.data_type, m.byte_order.unwrap_or(encoding.byte_order)),
                )
            })
            .collect();
        Self {
            members,
            byte_order: encoding.byte_order,
        }
    }

    fn get(&self, path: &str, data_type: DataType) -> (BinaryDataType, ByteOrder) {
        self.members
            .get(path)
            .copied()
            .unwrap_or((BinaryDataType::default_for(data_type), self.byte_order))
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Raw or base64 wrapped input.
enum ByteSource<R: Read> {
    Raw(R),
    Base64(DecoderReader<'static, GeneralPurpose, R>),
}

impl<R: Read> Read for ByteSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteSource::Raw(r) => r.read(buf),
            ByteSource::Base64(r) => r.read(buf),
        }
    }
}

macro_rules! read_number {
    ($self:ident, $ty:ty, $order:expr) => {{
        let bytes = $self.read_bytes::<{ std::mem::size_of::<$ty>() }>()?;
        match $order {
            ByteOrder::BigEndian => <$ty>::from_be_bytes(bytes),
            ByteOrder::LittleEndian => <$ty>::from_le_bytes(bytes),
        }
    }};
}

/// Token reader over a binary stream.
pub struct BinaryReader<R: Read> {
    input: BufReader<io::Take<ByteSource<R>>>,
    layout: MemberLayout,
    offset: u64,
    max_string_length: usize,
}

impl<R: Read> BinaryReader<R> {
    pub fn new(input: R, encoding: &BinaryEncoding, max_string_length: usize) -> Self {
        let source = match encoding.byte_encoding {
            ByteEncoding::Raw => ByteSource::Raw(input),
            ByteEncoding::Base64 => ByteSource::Base64(DecoderReader::new(input, &STANDARD)),
        };
        // the stream ends after byte_length decoded bytes when it is given
        let limit = encoding.byte_length.unwrap_or(u64::MAX);
        Self {
            input: BufReader::new(source.take(limit)),
            layout: MemberLayout::new(encoding),
            offset: 0,
            max_string_length,
        }
    }

    fn io_error(&self, err: io::Error) -> CodecError {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => CodecError::Truncated {
                offset: self.offset,
            },
            // base64 decoding failures surface as invalid data
            io::ErrorKind::InvalidData => CodecError::parse(self.offset, err.to_string()),
            _ => CodecError::Io(err),
        }
    }

    fn read_bytes<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.input
            .read_exact(&mut buf)
            .map_err(|e| self.io_error(e))?;
        self.offset += N as u64;
        Ok(buf)
    }

    fn read_string(&mut self, order: ByteOrder) -> CodecResult<String> {
        let start = self.offset;
        let len = read_number!(self, u16, order) as usize;
        if len > self.max_string_length {
            return Err(CodecError::parse(
                start,
                format!(
                    "string of {} bytes exceeds limit {}",
                    len, self.max_string_length
                ),
            ));
        }
        let mut buf = vec![0u8; len];
        self.input
            .read_exact(&mut buf)
            .map_err(|e| self.io_error(e))?;
        self.offset += len as u64;
        String::from_utf8(buf).map_err(|e| CodecError::parse(start, e.to_string()))
    }

    fn read_value(&mut self, wire: BinaryDataType, order: ByteOrder) -> CodecResult<Value> {
        let start = self.offset;
        Ok(match wire {
            BinaryDataType::Boolean => Value::Boolean(read_number!(self, u8, order) != 0),
            BinaryDataType::SignedByte => Value::Byte(read_number!(self, i8, order)),
            BinaryDataType::UnsignedByte => Value::Short(read_number!(self, u8, order) as i16),
            BinaryDataType::SignedShort => Value::Short(read_number!(self, i16, order)),
            BinaryDataType::UnsignedShort => Value::Int(read_number!(self, u16, order) as i32),
            BinaryDataType::SignedInt => Value::Int(read_number!(self, i32, order)),
            BinaryDataType::UnsignedInt => Value::Long(read_number!(self, u32, order) as i64),
            BinaryDataType::SignedLong => Value::Long(read_number!(self, i64, order)),
            BinaryDataType::UnsignedLong => {
                let v = read_number!(self, u64, order);
                Value::Long(i64::try_from(v).map_err(|_| {
                    CodecError::parse(start, format!("unsigned long {} out of range", v))
                })?)
            }
            BinaryDataType::Float32 => Value::Float(read_number!(self, f32, order)),
            BinaryDataType::Float64 => Value::Double(read_number!(self, f64, order)),
            BinaryDataType::Utf8String => Value::Text(self.read_string(order)?),
        })
    }
}

impl<R: Read> TokenReader for BinaryReader<R> {
    fn offset(&self) -> u64 {
        self.offset
    }

    fn begin_record(&mut self) -> CodecResult<bool> {
        match self.input.fill_buf() {
            Ok(available) => Ok(!available.is_empty()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn end_record(&mut self) -> CodecResult<()> {
        Ok(())
    }

    fn read_scalar(&mut self, path: &str, data_type: DataType) -> CodecResult<Value> {
        let (wire, order) = self.layout.get(path, data_type);
        self.read_value(wire, order)
    }

    fn read_count(&mut self, _path: &str) -> CodecResult<i64> {
        let order = self.layout.byte_order;
        Ok(read_number!(self, i32, order) as i64)
    }

    fn read_choice(&mut self, _path: &str, _items: &[DataComponent]) -> CodecResult<i64> {
        Ok(read_number!(self, u8, ByteOrder::BigEndian) as i64)
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Raw or base64 wrapped output.
enum ByteSink<W: Write> {
    Raw(W),
    Base64(EncoderWriter<'static, GeneralPurpose, W>),
}

impl<W: Write> Write for ByteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ByteSink::Raw(w) => w.write(buf),
            ByteSink::Base64(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ByteSink::Raw(w) => w.flush(),
            ByteSink::Base64(w) => w.flush(),
        }
    }
}

macro_rules! write_number {
    ($self:ident, $value:expr, $order:expr) => {{
        let v = $value;
        match $order {
            ByteOrder::BigEndian => $self.output.write_all(&v.to_be_bytes())?,
            ByteOrder::LittleEndian => $self.output.write_all(&v.to_le_bytes())?,
        }
    }};
}

/// Token writer producing a binary stream.
pub struct BinaryWriter<W: Write> {
    output: ByteSink<W>,
    layout: MemberLayout,
}

/// Convert a value for the wire, reporting failures as write errors.
fn wire_value<T>(path: &str, converted: swe_common::DataResult<T>) -> CodecResult<T> {
    converted.map_err(|e| CodecError::write(format!("'{}': {}", path, e)))
}

fn narrow<T: TryFrom<i64>>(path: &str, v: i64, wire: BinaryDataType) -> CodecResult<T> {
    T::try_from(v).map_err(|_| {
        CodecError::write(format!("'{}': {} does not fit in {:?}", path, v, wire))
    })
}

impl<W: Write> BinaryWriter<W> {
    pub fn new(output: W, encoding: &BinaryEncoding) -> Self {
        let output = match encoding.byte_encoding {
            ByteEncoding::Raw => ByteSink::Raw(output),
            ByteEncoding::Base64 => ByteSink::Base64(EncoderWriter::new(output, &STANDARD)),
        };
        Self {
            output,
            layout: MemberLayout::new(encoding),
        }
    }

    /// Flush pending output (including base64 padding) and return the sink.
    pub fn finish(self) -> CodecResult<W> {
        match self.output {
            ByteSink::Raw(mut w) => {
                w.flush()?;
                Ok(w)
            }
            ByteSink::Base64(mut w) => Ok(w.finish()?),
        }
    }

    fn write_value(
        &mut self,
        path: &str,
        wire: BinaryDataType,
        order: ByteOrder,
        value: &Value,
    ) -> CodecResult<()> {
        match wire {
            BinaryDataType::Boolean => {
                let b = wire_value(path, value.as_boolean())?;
                write_number!(self, b as u8, order)
            }
            BinaryDataType::SignedByte => write_number!(self, wire_value(path, value.as_byte())?, order),
            BinaryDataType::UnsignedByte => {
                let v: u8 = narrow(path, wire_value(path, value.as_long())?, wire)?;
                write_number!(self, v, order)
            }
            BinaryDataType::SignedShort => {
                write_number!(self, wire_value(path, value.as_short())?, order)
            }
            BinaryDataType::UnsignedShort => {
                let v: u16 = narrow(path, wire_value(path, value.as_long())?, wire)?;
                write_number!(self, v, order)
            }
            BinaryDataType::SignedInt => write_number!(self, wire_value(path, value.as_int())?, order),
            BinaryDataType::UnsignedInt => {
                let v: u32 = narrow(path, wire_value(path, value.as_long())?, wire)?;
                write_number!(self, v, order)
            }
            BinaryDataType::SignedLong => {
                write_number!(self, wire_value(path, value.as_long())?, order)
            }
            BinaryDataType::UnsignedLong => {
                let v: u64 = narrow(path, wire_value(path, value.as_long())?, wire)?;
                write_number!(self, v, order)
            }
            BinaryDataType::Float32 => {
                write_number!(self, wire_value(path, value.as_float())?, order)
            }
            BinaryDataType::Float64 => {
                write_number!(self, wire_value(path, value.as_double())?, order)
            }
            BinaryDataType::Utf8String => {
                let text = value.as_text();
                let len: u16 = narrow(path, text.len() as i64, wire)?;
                write_number!(self, len, order);
                self.output.write_all(text.as_bytes())?;
            }
        }
        Ok(())
    }
}

impl<W: Write> TokenWriter for BinaryWriter<W> {
    fn begin_record(&mut self) -> CodecResult<()> {
        Ok(())
    }

    fn end_record(&mut self) -> CodecResult<()> {
        Ok(())
    }

    fn write_scalar(&mut self, path: &str, data_type: DataType, value: &Value) -> CodecResult<()> {
        let (wire, order) = self.layout.get(path, data_type);
        self.write_value(path, wire, order, value)
    }

    fn write_count(&mut self, path: &str, count: usize) -> CodecResult<()> {
        let order = self.layout.byte_order;
        let count: i32 = narrow(path, count as i64, BinaryDataType::SignedInt)?;
        write_number!(self, count, order);
        Ok(())
    }

    fn write_choice(&mut self, path: &str, index: usize, _item: &str) -> CodecResult<()> {
        let index: u8 = narrow(path, index as i64, BinaryDataType::UnsignedByte)?;
        self.output.write_all(&[index])?;
        Ok(())
    }
}
