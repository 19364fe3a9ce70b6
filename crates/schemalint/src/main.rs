mod logging;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use schemalint_core::pointer::normalize;
use schemalint_core::{
    CONFIG_FILE_NAME, Detector, DiscoveryRegistry, Formatter, Layout, Loader, LoaderStream,
    MessageError, SchemaSource, SchemaValidator, Stream, WithMessages, WithValidator,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Lint a YAML or JSON document, following `$ref` across files
#[derive(Parser, Debug)]
#[command(name = "schemalint", version)]
#[command(about = "Lint YAML/JSON documents and report every problem with its position", long_about = None)]
struct Args {
    /// Document to lint
    #[arg(value_name = "FILENAME")]
    filename: PathBuf,

    /// Schema to validate against: a file path or an http(s) URL
    #[arg(short = 's', long, value_name = "PATH_OR_URL")]
    schema: Option<String>,

    /// Look up the schema in the nearest .schemalint.toml
    #[arg(short = 'g', long)]
    guess_schema: bool,

    /// Output layout
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Ltsv)]
    output: OutputFormat,

    /// Exit successfully whatever is found
    #[arg(long)]
    always_success: bool,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    logging: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Ltsv,
    Json,
}

impl From<OutputFormat> for Layout {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Ltsv => Layout::Ltsv,
            OutputFormat::Json => Layout::Json,
        }
    }
}

fn main() {
    let args = Args::parse();
    logging::init(&args.logging);

    let root = root_name(&args.filename);
    let formatter = Formatter::new(Detector::new(&root), args.output.into());

    match run(&args, &root, &formatter) {
        Ok(failed) => {
            if failed && !args.always_success {
                process::exit(1);
            }
        }
        Err(e) if args.always_success => {
            let message = format!("{:#}", e);
            tracing::error!(error = %message, "internal failure");
            match formatter.format_message(&MessageError::internal(message)) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Error: {}", e),
            }
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Lint one document and print its records. Returns true when any record
/// counts as a failure.
fn run(args: &Args, root: &str, formatter: &Formatter) -> Result<bool> {
    let mut messages = Vec::new();
    let mut schema = args.schema.as_deref().map(SchemaSource::parse);

    if args.guess_schema {
        let message = match DiscoveryRegistry::with_defaults().resolve_schema(Path::new(root)) {
            Ok(Some(found)) if schema.is_some() => {
                format!("schema discovered: {found} (--schema takes precedence)")
            }
            Ok(Some(found)) => {
                let message = format!("schema discovered: {found}");
                schema = Some(found);
                message
            }
            Ok(None) => format!("no schema discovered ({CONFIG_FILE_NAME} not found or has no entry)"),
            Err(e) => {
                tracing::warn!(error = %e, "schema discovery failed");
                format!("schema discovery failed: {e}")
            }
        };
        messages.push(MessageError::info(message));
    }

    let base = WithMessages::new(LoaderStream::new(Loader::new(root)), messages);
    let stream: Box<dyn Stream> = match schema {
        Some(source) => {
            let document = source
                .load()
                .with_context(|| format!("Failed to load schema: {source}"))?;
            let validator = SchemaValidator::new(&document, true)
                .with_context(|| format!("Failed to compile schema: {source}"))?;
            Box::new(WithValidator::new(base, validator))
        }
        None => Box::new(base),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;
    for event in stream.events() {
        let line = formatter
            .format(&event)
            .context("Failed to format record")?;
        writeln!(out, "{}", line).context("Failed to write record")?;
        failed |= !event.is_soft();
    }
    Ok(failed)
}

/// The document path as it appears in records: absolute and normalized.
fn root_name(filename: &Path) -> String {
    let absolute = std::path::absolute(filename).unwrap_or_else(|_| filename.to_path_buf());
    normalize(&absolute).to_string_lossy().into_owned()
}
