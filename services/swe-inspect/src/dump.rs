//! Decode a stream record by record and re-encode each record.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use swe_codec::{CodecConfig, DataStreamParser, DataStreamWriter, ParserState};
use swe_common::{DataComponent, DataEncoding};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Fail on the first malformed record instead of skipping it.
    pub strict: bool,
    /// Stop after this many records.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpSummary {
    pub records: u64,
    pub skipped: u64,
}

/// Decode `input` with `input_encoding` and write every record to `output`
/// with `output_encoding`.
///
/// Returns the summary and the output sink.
pub fn transcode<R: Read, W: Write>(
    schema: &DataComponent,
    input_encoding: &DataEncoding,
    input: R,
    output_encoding: &DataEncoding,
    output: W,
    config: CodecConfig,
    options: &DumpOptions,
) -> Result<(DumpSummary, W)> {
    let mut parser = DataStreamParser::new(schema.copy_structure(), input_encoding, input, config)
        .context("creating stream parser")?;
    let mut writer =
        DataStreamWriter::new(schema, output_encoding, output).context("creating stream writer")?;
    let mut summary = DumpSummary::default();

    while options.limit.map_or(true, |limit| summary.records < limit) {
        match parser.parse_next_block() {
            Ok(Some(block)) => {
                writer
                    .write_block(&block)
                    .with_context(|| format!("writing record {}", summary.records + 1))?;
                summary.records += 1;
            }
            Ok(None) => break,
            Err(e) if !options.strict && matches!(parser.state(), ParserState::NeedsResync { .. }) => {
                warn!(error = %e, "Skipping malformed record");
                summary.skipped += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("decoding record {}", summary.records + 1))
            }
        }
    }

    info!(
        records = summary.records,
        skipped = summary.skipped,
        input = input_encoding.name(),
        output = output_encoding.name(),
        "Finished transcoding"
    );
    let output = writer.finish().context("flushing output")?;
    Ok((summary, output))
}
