//! contourgen: generalize contour lines while keeping every hydrography
//! crossing as an exact vertex.
//!
//! Reads a JSON feature document, keeps the contours on the target
//! equidistance, generalizes them in parallel against the hydrography
//! network, and writes the results with per-contour statistics. Optional
//! outputs: a CSV statistics table, a diagnostic SVG overlay, and batch
//! diagnostics as JSON.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin contourgen -- [OPTIONS] <INPUT>
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod input;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use contourgen_export::{OverlayLayers, StatsRow, SvgMetadata};
use contourgen_pipeline::diagnostics::{BatchDiagnostics, Clock};
use contourgen_pipeline::{
    OverlapPolicy, PipelineError, Point, Polyline, ReferenceNetwork, SimplificationResult,
    SimplifyConfig, StagedFeature,
};
use tracing_subscriber::EnvFilter;

use input::{InputDocument, OutputRecord, select_by_equidistance};

/// Default contour interval kept from the input, in metres.
const DEFAULT_EQUIDISTANCE: f64 = 20.0;

/// Contour generalization with hydrography constraints.
///
/// Simplifies each contour with Douglas-Peucker, keeps the points where it
/// crosses a stream fixed, and falls back to the original line when the
/// result drifts further than the Hausdorff limit.
#[derive(Parser)]
#[command(name = "contourgen", version)]
struct Cli {
    /// Path to the input JSON document (`contours` and `hydrography`).
    input: PathBuf,

    /// Douglas-Peucker tolerance in map units.
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Maximum Hausdorff distance between original and generalized line.
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_HAUSDORFF_LIMIT)]
    hausdorff_limit: f64,

    /// Distance below which a point counts as lying on a line.
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_COINCIDENCE_TOLERANCE)]
    coincidence_tolerance: f64,

    /// How stretches where a contour runs along a stream are pinned.
    #[arg(long, value_enum, default_value_t = Overlap::Endpoints)]
    overlap_policy: Overlap,

    /// Keep only contours whose elevation is a multiple of this interval.
    #[arg(long, default_value_t = DEFAULT_EQUIDISTANCE)]
    equidistance: f64,

    /// Full simplification config as a JSON string.
    ///
    /// When provided, the individual parameter flags above are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the generalized contours (JSON) here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write per-contour statistics as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write a diagnostic SVG overlay.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write batch diagnostics as JSON.
    #[arg(long)]
    diagnostics_json: Option<PathBuf>,

    /// Worker threads (default: one per core).
    #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    threads: Option<usize>,
}

/// Collinear overlap handling.
#[derive(Clone, Copy, ValueEnum)]
enum Overlap {
    /// Pin both ends of the shared stretch.
    Endpoints,
    /// Only point crossings are pinned.
    Ignore,
}

/// Build a [`SimplifyConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<SimplifyConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        SimplifyConfig {
            tolerance: cli.tolerance,
            hausdorff_limit: cli.hausdorff_limit,
            coincidence_tolerance: cli.coincidence_tolerance,
            overlap_policy: match cli.overlap_policy {
                Overlap::Endpoints => OverlapPolicy::Endpoints,
                Overlap::Ignore => OverlapPolicy::Ignore,
            },
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;
    if !cli.equidistance.is_finite() || cli.equidistance <= 0.0 {
        return Err(format!(
            "--equidistance must be finite and positive, got {}",
            cli.equidistance
        ));
    }

    let text = std::fs::read_to_string(&cli.input)
        .map_err(|e| format!("Error reading {}: {e}", cli.input.display()))?;
    let document = InputDocument::from_json(&text)
        .map_err(|e| format!("Error parsing {}: {e}", cli.input.display()))?;

    let total = document.contours.len();
    let selected = select_by_equidistance(document.contours, cli.equidistance);
    tracing::info!(
        total,
        selected = selected.len(),
        equidistance = cli.equidistance,
        streams = document.hydrography.len(),
        "loaded features",
    );

    let network = ReferenceNetwork::new(&document.hydrography);
    let lines: Vec<Polyline> = selected.iter().map(|(_, c)| c.geometry.clone()).collect();

    let (staged, diagnostics) = run_batch(&lines, &network, &config, cli.threads)?;
    let mut crossings: Vec<Point> = Vec::new();
    let results: Vec<Result<SimplificationResult, PipelineError>> = staged
        .into_iter()
        .map(|outcome| {
            outcome.map(|feature| {
                crossings.extend(feature.constraints.iter());
                feature.result
            })
        })
        .collect();

    let records: Vec<OutputRecord<'_>> = selected
        .iter()
        .zip(&results)
        .map(|((id, feature), outcome)| OutputRecord::new(*id, feature, outcome))
        .collect();
    let json = serde_json::to_string_pretty(&records)
        .map_err(|e| format!("Error serializing results: {e}"))?;
    match cli.output {
        Some(ref path) => write_file(path, &json, "results")?,
        None => println!("{json}"),
    }

    if let Some(ref path) = cli.csv {
        let rows: Vec<StatsRow> = selected
            .iter()
            .zip(&results)
            .map(|((id, feature), outcome)| {
                StatsRow::new(*id, feature.elevation, feature.geometry.len(), outcome)
            })
            .collect();
        let csv = contourgen_export::to_csv(&rows).map_err(|e| format!("Error building CSV: {e}"))?;
        write_file(path, &csv, "CSV")?;
    }

    if let Some(ref path) = cli.svg {
        let svg = overlay_svg(cli, &config, &document.hydrography, &lines, &results, &crossings)?;
        write_file(path, &svg, "SVG")?;
    }

    if let Some(ref path) = cli.diagnostics_json {
        let json = serde_json::to_string_pretty(&diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        write_file(path, &json, "diagnostics")?;
    }

    eprintln!("{}", diagnostics.report());
    Ok(())
}

type BatchOutput = (Vec<Result<StagedFeature, PipelineError>>, BatchDiagnostics);

/// Run the batch, on a dedicated pool when `threads` is set.
fn run_batch(
    lines: &[Polyline],
    network: &ReferenceNetwork,
    config: &SimplifyConfig,
    threads: Option<usize>,
) -> Result<BatchOutput, String> {
    let batch =
        || contourgen_pipeline::simplify_batch_with_diagnostics(lines, network, config, &StdClock);
    match threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| format!("Error building thread pool: {e}"))?;
            tracing::debug!(threads = n, "using dedicated thread pool");
            Ok(pool.install(batch))
        }
        None => Ok(batch()),
    }
}

/// Draw every stream, original, generalized line, and pinned crossing.
fn overlay_svg(
    cli: &Cli,
    config: &SimplifyConfig,
    hydrography: &[Polyline],
    originals: &[Polyline],
    results: &[Result<SimplificationResult, PipelineError>],
    crossings: &[Point],
) -> Result<String, String> {
    let generalized: Vec<Polyline> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|r| r.geometry.clone())
        .collect();

    let config_json = serde_json::to_string(config)
        .map_err(|e| format!("Error serializing config: {e}"))?;
    let title = cli
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("contours");
    let description = format!(
        "tolerance={} hausdorff_limit={} equidistance={}",
        config.tolerance, config.hausdorff_limit, cli.equidistance,
    );
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&description),
        config_json: Some(&config_json),
    };
    let layers = OverlayLayers {
        hydrography,
        originals,
        generalized: &generalized,
        constraint_points: crossings,
    };
    Ok(contourgen_export::to_overlay_svg(&layers, &metadata))
}

fn write_file(path: &Path, contents: &str, what: &str) -> Result<(), String> {
    std::fs::write(path, contents)
        .map_err(|e| format!("Error writing {what} to {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote {what}");
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
