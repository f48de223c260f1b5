#![forbid(unsafe_code)]
//! # datatable-codec: convert one datatable per run.
//!
//! `musicinfo.bin` is decoded to `musicinfo <key>.json` (or `musicinfo.json`
//! when the container is not encrypted). Passing the JSON back encodes it to
//! `musicinfo.bin`, encrypted with the key named in the file name.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use datatable_codec::{CodecError, Converted, convert_path, default_config_path, load_key_config};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_CLI: i32 = 2;
const EXIT_NO_KEY: i32 = 3;
const EXIT_IO: i32 = 4;
const EXIT_CRYPTO: i32 = 5;
const EXIT_FORMAT: i32 = 6;

#[derive(Parser, Debug)]
#[command(
    name = "datatable-codec",
    version,
    about = "Convert datatable .bin containers to .json and back"
)]
struct Cli {
    /// Datatable to convert: a .bin container or a .json file
    input: PathBuf,

    /// Key file. Defaults to datatable_keys.ini next to the executable.
    #[arg(short = 'k', long = "keys", env = "DATATABLE_KEYS")]
    keys: Option<PathBuf>,

    /// Output file. If omitted, it is derived from the input name (and key).
    #[arg(short = 'o', long = "out")]
    output: Option<PathBuf>,
}

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { EXIT_CLI } else { EXIT_SUCCESS };
        }
    };

    match cmd_convert(&cli) {
        Ok(converted) => {
            match converted.key {
                Some(key) => eprintln!("Wrote {} (key '{key}')", converted.output.display()),
                None => eprintln!("Wrote {}", converted.output.display()),
            }
            EXIT_SUCCESS
        }
        Err(err) => {
            report_error(&err);
            map_exit_code(&err)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn cmd_convert(cli: &Cli) -> Result<Converted> {
    let keys_path = cli
        .keys
        .clone()
        .or_else(default_config_path)
        .context("cannot locate the key file; pass --keys")?;
    let config = load_key_config(&keys_path)
        .with_context(|| format!("failed to load key file {}", keys_path.display()))?;

    convert_path(&cli.input, cli.output.as_deref(), &config)
        .with_context(|| format!("failed to convert {}", cli.input.display()))
}

fn report_error(err: &anyhow::Error) {
    debug!(error = ?err, "conversion failed");
    eprintln!("error: {err:#}");
    if matches!(err.downcast_ref::<CodecError>(), Some(CodecError::NoMatchingKey)) {
        eprintln!("hint: none of the keys in the key file fits this datatable");
    }
}

fn map_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CodecError>() {
        Some(CodecError::NoMatchingKey) => EXIT_NO_KEY,
        Some(CodecError::Io(_) | CodecError::WriteFailed(_)) => EXIT_IO,
        Some(CodecError::DecryptionFailed(_)) => EXIT_CRYPTO,
        Some(CodecError::UnknownFileExtension(_) | CodecError::Invalid(_)) => EXIT_CLI,
        Some(
            CodecError::InputTooShort { .. }
            | CodecError::InputTooLarge { .. }
            | CodecError::DecompressionFailed(_)
            | CodecError::CompressionFailed(_)
            | CodecError::KeyConfig(_),
        ) => EXIT_FORMAT,
        None => EXIT_IO,
    }
}
