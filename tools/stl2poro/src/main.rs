//! stl2poro: porosity grids from STL meshes.
//!
//! Reads a `key=value` run configuration, samples the signed distance of the
//! mesh on a regular grid, derives the requested density fields and writes
//! them as CSV and/or VTK image data.
//!
//! ```text
//! stl2poro config.txt
//! stl2poro config.txt --threads 8 --csv out.csv --no-vti -v
//! ```
//!
//! Log verbosity follows `RUST_LOG` when set.

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use mesh_io::load_mesh;
use mesh_porosity::{
    CsvWriter, GridSink, PorosityConfig, VtiWriter, run_pipeline, write_grid,
};
use mesh_sdf::SignedDistanceField;
use tempfile::NamedTempFile;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Porosity fields from STL meshes
#[derive(Debug, Parser)]
#[command(name = "stl2poro")]
#[command(about = "Convert an STL mesh into porosity density grids", long_about = None)]
#[command(version)]
struct Cli {
    /// Run configuration file
    #[arg(name = "CONFIG", default_value = "config.txt")]
    config: PathBuf,

    /// Worker threads (0 = all cores, 1 = sequential); overrides `numThreads`
    #[arg(long)]
    threads: Option<usize>,

    /// CSV output path; overrides `outputCsvFileName`
    #[arg(long)]
    csv: Option<PathBuf>,

    /// VTI output path; overrides `outputVtkFilePath` and enables VTI output
    #[arg(long, conflicts_with = "no_vti")]
    vti: Option<PathBuf>,

    /// Skip VTI output
    #[arg(long)]
    no_vti: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut PorosityConfig) {
        if let Some(threads) = self.threads {
            config.num_threads = threads;
        }
        if let Some(csv) = &self.csv {
            config.csv_file = Some(csv.clone());
        }
        if let Some(vti) = &self.vti {
            config.vti_file = Some(vti.clone());
            config.write_vti = true;
        }
        if self.no_vti {
            config.write_vti = false;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let mut config = PorosityConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    cli.apply(&mut config);

    let mesh = load_mesh(&config.stl_file)
        .with_context(|| format!("Failed to load mesh {}", config.stl_file.display()))?;
    info!(
        path = %config.stl_file.display(),
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "input mesh"
    );
    let sdf = SignedDistanceField::new(mesh).context("Failed to build distance field")?;

    let params = config.pipeline_params();
    info!(
        threads = config.num_threads,
        grid = config.grid,
        axis = %config.axis,
        thickness = config.thickness,
        "computing porosity"
    );
    let grid = run_pipeline(&sdf, &params).context("Porosity computation failed")?;

    // Sinks write to temporary files next to their destinations, which only
    // replace the destinations once every sink has succeeded.
    let mut csv = match &config.csv_file {
        Some(path) => Some((path.as_path(), CsvWriter::new(stage(path)?))),
        None => None,
    };
    let mut vti = match config.vti_output() {
        Some(path) => Some((path, VtiWriter::new(stage(path)?))),
        None => None,
    };

    let mut targets: Vec<&mut dyn GridSink> = Vec::new();
    if let Some((_, writer)) = &mut csv {
        targets.push(writer);
    }
    if let Some((_, writer)) = &mut vti {
        targets.push(writer);
    }
    if targets.is_empty() {
        warn!("no output requested, fields are discarded");
    }
    write_grid(&grid, &mut targets).context("Failed to write output")?;

    if let Some((path, writer)) = csv {
        commit(writer.into_inner(), path)?;
        info!(path = %path.display(), "CSV output");
    }
    if let Some((path, writer)) = vti {
        commit(writer.into_inner(), path)?;
        info!(path = %path.display(), "VTI output");
    }

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "done"
    );
    Ok(())
}

/// Open a temporary file in the directory of `path`.
fn stage(path: &Path) -> Result<BufWriter<NamedTempFile>> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Move a finished temporary file onto `path`.
fn commit(writer: BufWriter<NamedTempFile>, path: &Path) -> Result<()> {
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.persist(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(())
}
