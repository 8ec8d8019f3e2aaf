//! Inspect SWE Common data streams.
//!
//! Decodes a binary, text or JSON stream against a schema document and
//! writes every record to stdout, as JSON lines by default or in any other
//! encoding given by `--output-encoding`.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use swe_common::{DataEncoding, JsonEncoding};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use swe_inspect::{load_config, load_encoding, load_schema, transcode, DumpOptions};

/// Decode a SWE Common data stream and dump its records
#[derive(Parser, Debug)]
#[command(name = "swe-inspect")]
#[command(about = "Decode SWE Common data streams record by record")]
struct Args {
    /// Schema definition document (JSON or YAML)
    #[arg(short, long, env = "SWE_SCHEMA")]
    schema: PathBuf,

    /// Encoding document describing the input stream
    #[arg(short, long, env = "SWE_ENCODING")]
    encoding: PathBuf,

    /// Encoding document for the output (default: JSON lines)
    #[arg(short, long)]
    output_encoding: Option<PathBuf>,

    /// Codec configuration document (default: SWE_* environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input stream, or - for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Fail on the first malformed record
    #[arg(long)]
    strict: bool,

    /// Stop after this many records
    #[arg(long)]
    limit: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Log level
    #[arg(long, default_value = "warn", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr, records to stdout
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let schema = load_schema(&args.schema)?;
    let input_encoding = load_encoding(&args.encoding)?;
    let output_encoding = match &args.output_encoding {
        Some(path) => load_encoding(path)?,
        None => DataEncoding::Json(JsonEncoding {
            pretty: args.pretty,
        }),
    };
    let config = load_config(args.config.as_deref())?;

    info!(
        schema = %args.schema.display(),
        input = %args.input,
        encoding = input_encoding.name(),
        "Starting swe-inspect"
    );

    let input: Box<dyn Read> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&args.input).with_context(|| format!("opening {}", args.input))?)
    };
    let output = BufWriter::new(io::stdout().lock());

    let options = DumpOptions {
        strict: args.strict,
        limit: args.limit,
    };
    let (summary, mut output) = transcode(
        &schema,
        &input_encoding,
        input,
        &output_encoding,
        output,
        config,
        &options,
    )?;
    output.flush()?;

    if summary.skipped > 0 {
        eprintln!(
            "{} records decoded, {} malformed records skipped",
            summary.records, summary.skipped
        );
    }

    Ok(())
}
