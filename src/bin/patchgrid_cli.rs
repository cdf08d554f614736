//! Out-of-band inspection tool for external-reader resources.
//!
//! `patchgrid-cli --file <path> --variable <name> --timestep <t> --x <x>
//! --y <y>`. Exit codes are the fixed table the core contract defines;
//! everything else about argument parsing follows `clap`'s derive API the
//! way `hut8-soar`'s own one-off CLIs do (e.g. `fetch_receivers.rs`'s
//! `#[derive(Parser)]` args struct).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use clap::Parser;

use patchstore::error::PatchStoreError;
use patchstore::external::csv_reader::CsvDataReader;
use patchstore::external::grid_resource::DataGridLayer;
use patchstore::external::{ClassifiedReader, DataFormat, ExternalDataReader};

#[derive(Parser, Debug)]
#[command(name = "patchgrid-cli", about = "Inspect a single value from an external patch-data resource.")]
struct Args {
    #[arg(long)]
    file: PathBuf,
    #[arg(long)]
    variable: String,
    #[arg(long)]
    timestep: String,
    #[arg(long)]
    x: String,
    #[arg(long)]
    y: String,
}

const EXIT_SUCCESS: i32 = 0;
const EXIT_FILE_NOT_FOUND: i32 = 1;
const EXIT_WRONG_EXTENSION: i32 = 2;
const EXIT_INVALID_TIMESTEP: i32 = 3;
const EXIT_INVALID_X: i32 = 4;
const EXIT_INVALID_Y: i32 = 5;
const EXIT_UNKNOWN_VARIABLE: i32 = 6;
const EXIT_OUT_OF_BOUNDS: i32 = 7;
const EXIT_CORRUPT_FILE: i32 = 8;

fn fail(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    std::process::exit(code);
}

fn main() {
    patchstore::telemetry::init();
    let args = Args::parse();

    if !args.file.exists() {
        fail(EXIT_FILE_NOT_FOUND, format!("file not found: {:?}", args.file));
    }

    let timestep: i64 = match args.timestep.parse() {
        Ok(t) => t,
        Err(_) => fail(EXIT_INVALID_TIMESTEP, format!("invalid timestep: {:?}", args.timestep)),
    };
    let x = match BigDecimal::from_str(&args.x) {
        Ok(v) => v,
        Err(_) => fail(EXIT_INVALID_X, format!("invalid x: {:?}", args.x)),
    };
    let y = match BigDecimal::from_str(&args.y) {
        Ok(v) => v,
        Err(_) => fail(EXIT_INVALID_Y, format!("invalid y: {:?}", args.y)),
    };

    let reader = match open_reader(&args.file) {
        Ok(reader) => reader,
        Err(CliError::WrongExtension) => fail(EXIT_WRONG_EXTENSION, format!("unsupported extension: {:?}", args.file)),
        Err(CliError::Corrupt(message)) => fail(EXIT_CORRUPT_FILE, message),
    };

    if !reader.variable_names().iter().any(|v| v == &args.variable) {
        fail(EXIT_UNKNOWN_VARIABLE, format!("unknown variable: {:?}", args.variable));
    }

    let value = match reader.read_value_at(&args.variable, &x, &y, timestep) {
        Ok(Some(value)) => value,
        Ok(None) => fail(EXIT_OUT_OF_BOUNDS, "coordinate or timestep out of bounds"),
        Err(PatchStoreError::Cancelled) => fail(EXIT_OUT_OF_BOUNDS, "read cancelled"),
        Err(other) => fail(EXIT_CORRUPT_FILE, other),
    };

    let number = value.as_f64().map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());
    let unit = value.unit.unwrap_or_default();
    println!("Value at ({x}, {y}, {timestep}): {number} {unit}");
    std::process::exit(EXIT_SUCCESS);
}

enum CliError {
    WrongExtension,
    Corrupt(String),
}

fn open_reader(path: &Path) -> Result<ClassifiedReader, CliError> {
    let format = patchstore::external::classify_format(path).map_err(|_| CliError::WrongExtension)?;
    match format {
        DataFormat::Csv => {
            let reader = CsvDataReader::open(path).map_err(|e| CliError::Corrupt(e.to_string()))?;
            Ok(ClassifiedReader::Csv(reader))
        }
        DataFormat::PrecomputedGrid => {
            let bytes = std::fs::read(path).map_err(|e| CliError::Corrupt(e.to_string()))?;
            let layer = DataGridLayer::decode(path, &bytes).map_err(|e| CliError::Corrupt(e.to_string()))?;
            Ok(ClassifiedReader::PrecomputedGrid(layer))
        }
        DataFormat::NetCdf | DataFormat::GeoTiff => Err(CliError::WrongExtension),
    }
}
