//! Stream codecs for SWE Common data.
//!
//! A [`DataStreamParser`] turns a binary, delimited text or JSON stream into
//! one [`DataBlock`] per record, and a [`DataStreamWriter`] does the reverse.
//! Both are driven by a [`DataComponent`] describing the record structure.

pub mod binary;
pub mod config;
pub mod error;
pub mod json;
pub mod parser;
pub mod text;
mod walk;
pub mod writer;

pub use binary::{BinaryReader, BinaryWriter};
pub use config::CodecConfig;
pub use error::{CodecError, CodecResult};
pub use json::{JsonReader, JsonWriter};
pub use parser::{DataStreamParser, ParserState};
pub use text::{TextReader, TextWriter};
pub use writer::DataStreamWriter;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use swe_common::{DataBlock, DataComponent, DataEncoding};

/// Encode `blocks` as a complete stream held in memory.
pub fn encode_to_bytes(
    component: &DataComponent,
    encoding: &DataEncoding,
    blocks: &[DataBlock],
) -> CodecResult<Bytes> {
    let mut writer = DataStreamWriter::new(component, encoding, BytesMut::new().writer())?;
    for block in blocks {
        writer.write_block(block)?;
    }
    Ok(writer.finish()?.into_inner().freeze())
}

/// Decode every record of an in-memory stream.
///
/// Stops at the first error, including text parse errors that a
/// [`DataStreamParser`] could skip.
pub fn decode_all(
    component: &DataComponent,
    encoding: &DataEncoding,
    data: Bytes,
    config: CodecConfig,
) -> CodecResult<Vec<DataBlock>> {
    let parser = DataStreamParser::new(component.copy_structure(), encoding, data.reader(), config)?;
    parser.collect()
}
