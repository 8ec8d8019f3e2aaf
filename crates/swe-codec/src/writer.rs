//! Record-at-a-time stream writer.

use std::io::Write;

use swe_common::{DataBlock, DataComponent, DataEncoding};
use tracing::{debug, trace};

use crate::binary::BinaryWriter;
use crate::error::{CodecError, CodecResult};
use crate::json::JsonWriter;
use crate::text::TextWriter;
use crate::walk;

enum RecordSink<W: Write> {
    Binary(BinaryWriter<W>),
    Text(TextWriter<W>),
    Json(JsonWriter<W>),
}

/// Encodes data blocks as records of a stream.
///
/// Each block is interpreted through the writer's own copy of the component
/// tree, so the caller's schema is never rebound.
pub struct DataStreamWriter<W: Write> {
    component: DataComponent,
    sink: RecordSink<W>,
    records: u64,
}

impl<W: Write> DataStreamWriter<W> {
    pub fn new(component: &DataComponent, encoding: &DataEncoding, output: W) -> CodecResult<Self> {
        encoding
            .validate()
            .map_err(|e| CodecError::Config(e.to_string()))?;
        let sink = match encoding {
            DataEncoding::Binary(binary) => RecordSink::Binary(BinaryWriter::new(output, binary)),
            DataEncoding::Text(text) => RecordSink::Text(TextWriter::new(output, text)),
            DataEncoding::Json(json) => RecordSink::Json(JsonWriter::new(output, json)),
        };
        debug!(
            component = component.name(),
            encoding = encoding.name(),
            "Created data stream writer"
        );
        Ok(Self {
            component: component.copy_structure(),
            sink,
            records: 0,
        })
    }

    /// Append one record.
    pub fn write_block(&mut self, block: &DataBlock) -> CodecResult<()> {
        match &mut self.sink {
            RecordSink::Binary(w) => walk::write_record(w, &mut self.component, block)?,
            RecordSink::Text(w) => walk::write_record(w, &mut self.component, block)?,
            RecordSink::Json(w) => w.write_record(&mut self.component, block)?,
        }
        self.records += 1;
        trace!(record = self.records, atoms = block.atom_count(), "Wrote record");
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Flush all pending output and return the underlying sink.
    pub fn finish(self) -> CodecResult<W> {
        debug!(records = self.records, "Finished data stream");
        match self.sink {
            RecordSink::Binary(w) => w.finish(),
            RecordSink::Text(w) => w.finish(),
            RecordSink::Json(w) => w.finish(),
        }
    }
}
