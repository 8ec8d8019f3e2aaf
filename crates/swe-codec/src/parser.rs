//! Record-at-a-time stream parser.

use std::io::Read;

use swe_common::{DataBlock, DataComponent, DataEncoding};
use tracing::{debug, trace, warn};

use crate::binary::BinaryReader;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::json::JsonReader;
use crate::text::TextReader;
use crate::walk::{self, TokenReader};

/// Where a parser stands between calls to
/// [`DataStreamParser::parse_next_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Positioned at the start of a record.
    Ready,
    /// A text record failed to parse; the next call skips to the following
    /// block separator first.
    NeedsResync { offset: u64 },
    /// A failure the stream cannot recover from. Every later call fails.
    Poisoned { offset: u64 },
    /// The input ended cleanly.
    Finished,
}

enum RecordSource<R: Read> {
    Binary(BinaryReader<R>),
    Text(TextReader<R>),
    Json(JsonReader<R>),
}

impl<R: Read> RecordSource<R> {
    fn offset(&self) -> u64 {
        match self {
            RecordSource::Binary(r) => r.offset(),
            RecordSource::Text(r) => r.offset(),
            RecordSource::Json(r) => r.offset(),
        }
    }

    fn read_record(&mut self, root: &mut DataComponent, config: &CodecConfig) -> CodecResult<bool> {
        match self {
            RecordSource::Binary(r) => walk::read_record(r, root, config),
            RecordSource::Text(r) => walk::read_record(r, root, config),
            RecordSource::Json(r) => r.read_record(root, config),
        }
    }
}

/// Decodes a stream into one data block per record.
///
/// The parser owns the root component and decodes each record into the
/// block bound to it. With `renew_data_block` (the default) every record
/// gets fresh storage, so returned blocks are independent. Without it the
/// same storage is reused and every returned block aliases the latest
/// record.
pub struct DataStreamParser<R: Read> {
    component: DataComponent,
    source: RecordSource<R>,
    config: CodecConfig,
    state: ParserState,
    records: u64,
    needs_fresh_block: bool,
}

impl<R: Read> DataStreamParser<R> {
    pub fn new(
        component: DataComponent,
        encoding: &DataEncoding,
        input: R,
        config: CodecConfig,
    ) -> CodecResult<Self> {
        config.validate().map_err(CodecError::Config)?;
        encoding
            .validate()
            .map_err(|e| CodecError::Config(e.to_string()))?;

        let source = match encoding {
            DataEncoding::Binary(binary) => {
                RecordSource::Binary(BinaryReader::new(input, binary, config.max_string_length))
            }
            DataEncoding::Text(text) => {
                RecordSource::Text(TextReader::new(input, text, config.max_string_length))
            }
            DataEncoding::Json(_) => RecordSource::Json(JsonReader::new(input)),
        };

        debug!(
            component = component.name(),
            encoding = encoding.name(),
            renew = config.renew_data_block,
            "Created data stream parser"
        );

        Ok(Self {
            component,
            source,
            config,
            state: ParserState::Ready,
            records: 0,
            needs_fresh_block: true,
        })
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// The root component, bound to the most recent record.
    pub fn component(&self) -> &DataComponent {
        &self.component
    }

    pub fn records_parsed(&self) -> u64 {
        self.records
    }

    /// Decode the next record.
    ///
    /// Returns `Ok(None)` once the input ends at a record boundary. A parse
    /// error in a text stream leaves the parser able to continue with the
    /// next record; any other failure poisons it.
    pub fn parse_next_block(&mut self) -> CodecResult<Option<DataBlock>> {
        match self.state {
            ParserState::Finished => return Ok(None),
            ParserState::Poisoned { offset } => return Err(CodecError::Poisoned { offset }),
            ParserState::NeedsResync { offset } => {
                if let RecordSource::Text(reader) = &mut self.source {
                    if let Err(e) = reader.resync() {
                        return Err(self.poison(e));
                    }
                }
                debug!(offset, resumed_at = self.source.offset(), "Resynchronized text stream");
                self.state = ParserState::Ready;
            }
            ParserState::Ready => {}
        }

        if self.config.renew_data_block || self.needs_fresh_block || !self.component.has_data() {
            if let Err(e) = self.component.assign_new_data_block() {
                return Err(self.poison(e.into()));
            }
            self.needs_fresh_block = false;
        }

        let start = self.source.offset();
        match self.source.read_record(&mut self.component, &self.config) {
            Ok(true) => {
                self.records += 1;
                trace!(record = self.records, start, "Parsed record");
                self.component.data_alias().map(Some).map_err(CodecError::from)
            }
            Ok(false) => {
                debug!(records = self.records, "End of data stream");
                self.state = ParserState::Finished;
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&mut self, err: CodecError) -> CodecError {
        self.needs_fresh_block = true;
        let resumable = matches!(err, CodecError::Parse { .. } | CodecError::Data(_))
            && matches!(self.source, RecordSource::Text(_))
            && self.config.resync_on_error;
        if resumable {
            let offset = err.offset().unwrap_or_else(|| self.source.offset());
            warn!(offset, error = %err, "Skipping malformed text record");
            self.state = ParserState::NeedsResync { offset };
            err
        } else {
            self.poison(err)
        }
    }

    fn poison(&mut self, err: CodecError) -> CodecError {
        let offset = err.offset().unwrap_or_else(|| self.source.offset());
        warn!(offset, error = %err, "Data stream poisoned");
        self.state = ParserState::Poisoned { offset };
        err
    }
}

impl<R: Read> Iterator for DataStreamParser<R> {
    type Item = CodecResult<DataBlock>;

    /// Yields each record, then stops. A poisoning error is yielded once.
    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, ParserState::Poisoned { .. }) {
            return None;
        }
        self.parse_next_block().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swe_common::{TextEncoding, Value};

    fn text_parser(input: &'static str) -> DataStreamParser<&'static [u8]> {
        let schema = DataComponent::record(
            "pair",
            vec![DataComponent::count("a"), DataComponent::quantity("b", "m")],
        );
        DataStreamParser::new(
            schema,
            &DataEncoding::Text(TextEncoding::default()),
            input.as_bytes(),
            CodecConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_finished_after_last_record() {
        let mut parser = text_parser("1,2.5\n");
        let block = parser.parse_next_block().unwrap().unwrap();
        assert_eq!(block.value(1), Value::Double(2.5));
        assert!(parser.parse_next_block().unwrap().is_none());
        assert_eq!(parser.state(), ParserState::Finished);
        assert!(parser.parse_next_block().unwrap().is_none());
    }

    #[test]
    fn test_bad_token_needs_resync() {
        let mut parser = text_parser("x,1\n2,3\n");
        assert!(matches!(
            parser.parse_next_block(),
            Err(CodecError::Parse { .. })
        ));
        assert!(matches!(parser.state(), ParserState::NeedsResync { .. }));
        let block = parser.parse_next_block().unwrap().unwrap();
        assert_eq!(block.value(0), Value::Int(2));
        assert_eq!(parser.records_parsed(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CodecConfig {
            max_array_size: 0,
            ..Default::default()
        };
        let result = DataStreamParser::new(
            DataComponent::count("n"),
            &DataEncoding::Text(TextEncoding::default()),
            &b""[..],
            config,
        );
        assert!(matches!(result, Err(CodecError::Config(_))));
    }
}
