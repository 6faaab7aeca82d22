//! Converts GML geometry documents between GML versions.
//!
//! Usage:
//!   cargo run --release --bin gml_convert -- <input.xml>... [options]
//!
//! Options:
//!   --from <2.1|3.0|3.1|3.2>  Version of the input documents (default 3.1)
//!   --to <2.1|3.0|3.1|3.2>    Version to write (default 3.1)
//!   --srs <name>              srsName to write; ordinates are relabelled, not reprojected
//!   --decimals <n>            Decimal places of written ordinates
//!   --simple                  Simple-features output (no ids, simple kinds only)
//!   --options <file.json>     Writer options as JSON; flags override them
//!   --summary                 Print a JSON summary per file instead of the XML
//!   --out-dir <dir>           Write <name>.gml files into <dir>

use std::env;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use gml_geometry::{
    read_geometry_from, CoordinateFormatter, ExportedIds, GeometryWriter, GmlVersion, Relabel, WriterOptions,
};

#[derive(Debug, Serialize)]
struct FileSummary {
    input: String,
    output: Option<String>,
    root: String,
    dimension: usize,
    objects: usize,
    references: usize,
    unresolved: Vec<String>,
    bytes_written: usize,
}

struct Conversion {
    inputs: Vec<PathBuf>,
    from: GmlVersion,
    options: WriterOptions,
    summary: bool,
    out_dir: Option<PathBuf>,
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} <input.xml>... [options]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --from <2.1|3.0|3.1|3.2>  Version of the input documents (default 3.1)");
    eprintln!("  --to <2.1|3.0|3.1|3.2>    Version to write (default 3.1)");
    eprintln!("  --srs <name>              srsName to write; ordinates are relabelled, not reprojected");
    eprintln!("  --decimals <n>            Decimal places of written ordinates");
    eprintln!("  --simple                  Simple-features output");
    eprintln!("  --options <file.json>     Writer options as JSON");
    eprintln!("  --summary                 Print a JSON summary per file");
    eprintln!("  --out-dir <dir>           Write converted files into <dir>");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} parcel.xml --from 2.1 --to 3.2", program);
    eprintln!("  {} a.xml b.xml --to 3.1 --decimals 3 --out-dir converted", program);
}

fn parse_args(args: &[String]) -> Result<Conversion> {
    let mut inputs = Vec::new();
    let mut from = GmlVersion::Gml31;
    let mut to: Option<GmlVersion> = None;
    let mut srs: Option<String> = None;
    let mut decimals: Option<usize> = None;
    let mut simple = false;
    let mut options_path: Option<PathBuf> = None;
    let mut summary = false;
    let mut out_dir: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--from" | "--to" | "--srs" | "--decimals" | "--options" | "--out-dir" => {
                let flag = args[i].as_str();
                let value = args
                    .get(i + 1)
                    .with_context(|| format!("{} needs a value", flag))?;
                match flag {
                    "--from" => from = value.parse()?,
                    "--to" => to = Some(value.parse()?),
                    "--srs" => srs = Some(value.clone()),
                    "--decimals" => {
                        decimals = Some(
                            value
                                .parse()
                                .with_context(|| format!("invalid --decimals value '{}'", value))?,
                        )
                    }
                    "--options" => options_path = Some(PathBuf::from(value)),
                    _ => out_dir = Some(PathBuf::from(value)),
                }
                i += 1;
            }
            "--simple" => simple = true,
            "--summary" => summary = true,
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            path => inputs.push(PathBuf::from(path)),
        }
        i += 1;
    }

    let mut options = match &options_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options file {}", path.display()))?;
            serde_json::from_str::<WriterOptions>(&text)
                .with_context(|| format!("Failed to parse options file {}", path.display()))?
        }
        None => WriterOptions::default(),
    };
    if let Some(to) = to {
        options.version = to;
    }
    if srs.is_some() {
        options.output_crs = srs;
    }
    if let Some(places) = decimals {
        options.formatter = CoordinateFormatter::Decimal { places };
    }
    options.simple_features |= simple;

    if inputs.is_empty() {
        bail!("no input files given");
    }
    Ok(Conversion {
        inputs,
        from,
        options,
        summary,
        out_dir,
    })
}

fn convert_file(path: &Path, conversion: &Conversion) -> Result<(FileSummary, String)> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let (geometry, ctx) = read_geometry_from(BufReader::new(file), conversion.from)
        .with_context(|| format!("Failed to read geometry from {}", path.display()))?;
    let unresolved: Vec<String> = ctx
        .references()
        .iter()
        .filter(|r| !r.is_resolved())
        .map(|r| r.href().to_string())
        .collect();
    debug!(file = %path.display(), objects = ctx.object_count(), "parsed geometry");

    // No reprojection library is linked in, so an output CRS only renames srsName
    let mut exported = ExportedIds::new();
    let mut writer = GeometryWriter::new(Vec::new(), &conversion.options, &mut exported).with_transformer(&Relabel);
    writer
        .write(&geometry)
        .with_context(|| format!("Failed to write {} as GML {}", path.display(), conversion.options.version))?;
    let xml = String::from_utf8(writer.finish()?).context("Writer produced invalid UTF-8")?;

    let output = match &conversion.out_dir {
        Some(dir) => {
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
            let target = dir.join(format!("{}.gml", stem));
            fs::write(&target, &xml).with_context(|| format!("Failed to write {}", target.display()))?;
            Some(target.display().to_string())
        }
        None => None,
    };

    let summary = FileSummary {
        input: path.display().to_string(),
        output,
        root: geometry.kind_name().to_string(),
        dimension: geometry.dimension(),
        objects: ctx.object_count(),
        references: ctx.references().len(),
        unresolved,
        bytes_written: xml.len(),
    };
    Ok((summary, xml))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage(&args[0]);
        return Ok(());
    }
    let conversion = parse_args(&args)?;
    if let Some(dir) = &conversion.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    info!(files = conversion.inputs.len(), to = %conversion.options.version, "converting");
    // Sessions are independent per file
    let results: Vec<Result<(FileSummary, String)>> = conversion
        .inputs
        .par_iter()
        .map(|path| convert_file(path, &conversion))
        .collect();

    let mut failures = 0;
    for result in results {
        match result {
            Ok((summary, xml)) => {
                if conversion.summary {
                    println!("{}", serde_json::to_string(&summary)?);
                } else if summary.output.is_none() {
                    println!("{}", xml);
                }
            }
            Err(err) => {
                failures += 1;
                eprintln!("Error: {:#}", err);
            }
        }
    }
    if failures > 0 {
        bail!("{} of {} files failed", failures, conversion.inputs.len());
    }
    Ok(())
}
