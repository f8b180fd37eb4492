//! `key=value` run configuration.
//!
//! One setting per line. Blank lines and lines starting with `#` are skipped,
//! keys and values are trimmed, and a repeated key keeps its last value.
//!
//! ```text
//! stlFilePath=part.stl
//! outputCsvFileName=part.csv
//! outputVtkFilePath=part.vti
//! outputVtk=true
//! boundsFactor=1.1 1.1 1.1 1.1 1.1 1.1
//! grid=64
//! axis=0
//! thickness=0.05
//! numThreads=4
//! ```
//!
//! `delta`, `thicknessUnits` (`absolute` or `cells`) and `fields` (a comma or
//! space separated list of field names) are optional.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::exec::Execution;
use crate::grid::{Axis, BoundsFactor};
use crate::pipeline::{FieldKind, PipelineParams, ThicknessUnits};

const STL_FILE: &str = "stlFilePath";
const CSV_FILE: &str = "outputCsvFileName";
const VTI_FILE: &str = "outputVtkFilePath";
const WRITE_VTI: &str = "outputVtk";
const BOUNDS_FACTOR: &str = "boundsFactor";
const GRID: &str = "grid";
const AXIS: &str = "axis";
const THICKNESS: &str = "thickness";
const THICKNESS_UNITS: &str = "thicknessUnits";
const DELTA: &str = "delta";
const FIELDS: &str = "fields";
const NUM_THREADS: &str = "numThreads";

const KNOWN_KEYS: [&str; 12] = [
    STL_FILE,
    CSV_FILE,
    VTI_FILE,
    WRITE_VTI,
    BOUNDS_FACTOR,
    GRID,
    AXIS,
    THICKNESS,
    THICKNESS_UNITS,
    DELTA,
    FIELDS,
    NUM_THREADS,
];

/// Settings for one run of the porosity tool.
#[derive(Debug, Clone, PartialEq)]
pub struct PorosityConfig {
    /// Input mesh.
    pub stl_file: PathBuf,
    /// CSV destination, if any.
    pub csv_file: Option<PathBuf>,
    /// VTI destination, if any.
    pub vti_file: Option<PathBuf>,
    /// Whether the VTI file is written.
    pub write_vti: bool,
    /// Bounding box multipliers.
    pub bounds_factor: BoundsFactor,
    /// Cells along the pitch axis.
    pub grid: usize,
    /// Pitch axis.
    pub axis: Axis,
    /// Porosity thickness.
    pub thickness: f64,
    /// Unit of `thickness`.
    pub thickness_units: ThicknessUnits,
    /// Multigrayscale band half-width.
    pub delta: f64,
    /// Fields to produce.
    pub fields: Vec<FieldKind>,
    /// Worker threads; `0` is the rayon default.
    pub num_threads: usize,
}

impl PorosityConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read, otherwise any error
    /// from parsing.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = text.parse()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Execution strategy for the configured thread count.
    #[must_use]
    pub const fn execution(&self) -> Execution {
        Execution::from_thread_count(self.num_threads)
    }

    /// VTI destination when VTI output is enabled.
    #[must_use]
    pub fn vti_output(&self) -> Option<&Path> {
        if self.write_vti {
            self.vti_file.as_deref()
        } else {
            None
        }
    }

    /// Pipeline parameters for this configuration.
    #[must_use]
    pub fn pipeline_params(&self) -> PipelineParams {
        PipelineParams::default()
            .with_bounds_factor(self.bounds_factor)
            .with_target_cells(self.grid)
            .with_axis(self.axis)
            .with_thickness(self.thickness)
            .with_thickness_units(self.thickness_units)
            .with_delta(self.delta)
            .with_fields(self.fields.clone())
            .with_execution(self.execution())
    }
}

impl FromStr for PorosityConfig {
    type Err = ConfigError;

    fn from_str(text: &str) -> ConfigResult<Self> {
        let entries = collect_entries(text)?;

        let stl_file = PathBuf::from(&required(&entries, STL_FILE)?.value);
        let csv_file = entries.get(CSV_FILE).map(|e| PathBuf::from(&e.value));
        let vti_file = entries.get(VTI_FILE).map(|e| PathBuf::from(&e.value));
        let write_vti = match entries.get(WRITE_VTI) {
            Some(entry) => entry.parse_with(WRITE_VTI, parse_bool)?,
            None => vti_file.is_some(),
        };
        if write_vti && vti_file.is_none() {
            return Err(ConfigError::MissingKey(VTI_FILE));
        }

        let bounds_factor = match entries.get(BOUNDS_FACTOR) {
            Some(entry) => entry.parse_with(BOUNDS_FACTOR, parse_bounds_factor)?,
            None => BoundsFactor::default(),
        };

        let grid_entry = required(&entries, GRID)?;
        let grid: usize = grid_entry.parse_with(GRID, parse_number)?;
        if grid == 0 {
            return Err(grid_entry.invalid(GRID, "must be at least 1"));
        }

        let axis = required(&entries, AXIS)?.parse_with(AXIS, parse_axis)?;

        let thickness_entry = required(&entries, THICKNESS)?;
        let thickness: f64 = thickness_entry.parse_with(THICKNESS, parse_number)?;
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(thickness_entry.invalid(THICKNESS, "must be positive and finite"));
        }

        let thickness_units = match entries.get(THICKNESS_UNITS) {
            Some(entry) => entry.parse_with(THICKNESS_UNITS, parse_number)?,
            None => ThicknessUnits::default(),
        };

        let delta = match entries.get(DELTA) {
            Some(entry) => {
                let delta: f64 = entry.parse_with(DELTA, parse_number)?;
                if !(delta > 0.0 && delta <= 1.0) {
                    return Err(entry.invalid(DELTA, "must lie in (0, 1]"));
                }
                delta
            }
            None => PipelineParams::default().delta,
        };

        let fields = match entries.get(FIELDS) {
            Some(entry) => entry.parse_with(FIELDS, parse_fields)?,
            None => FieldKind::DEFAULT_SET.to_vec(),
        };

        let num_threads: usize = match entries.get(NUM_THREADS) {
            Some(entry) => entry.parse_with(NUM_THREADS, parse_number)?,
            None => 0,
        };

        Ok(Self {
            stl_file,
            csv_file,
            vti_file,
            write_vti,
            bounds_factor,
            grid,
            axis,
            thickness,
            thickness_units,
            delta,
            fields,
            num_threads,
        })
    }
}

/// A raw value and the line it came from.
#[derive(Debug)]
struct Entry {
    line: usize,
    value: String,
}

impl Entry {
    fn parse_with<T>(
        &self,
        key: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> ConfigResult<T> {
        parse(&self.value).map_err(|reason| self.invalid(key, reason))
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            key: key.to_string(),
            line: self.line,
            value: self.value.clone(),
            reason: reason.into(),
        }
    }
}

fn collect_entries(text: &str) -> ConfigResult<HashMap<String, Entry>> {
    let mut entries = HashMap::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(ConfigError::Syntax {
                line,
                content: trimmed.to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::Syntax {
                line,
                content: trimmed.to_string(),
            });
        }
        if !KNOWN_KEYS.contains(&key) {
            warn!(key, line, "ignoring unknown config key");
            continue;
        }
        let entry = Entry {
            line,
            value: value.trim().to_string(),
        };
        if let Some(previous) = entries.insert(key.to_string(), entry) {
            warn!(key, line, previous_line = previous.line, "config key repeated, last value wins");
        }
    }
    Ok(entries)
}

fn required<'a>(entries: &'a HashMap<String, Entry>, key: &'static str) -> ConfigResult<&'a Entry> {
    entries.get(key).ok_or(ConfigError::MissingKey(key))
}

fn parse_number<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| e.to_string())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err("expected `true`, `false`, `1` or `0`".to_string()),
    }
}

fn parse_axis(value: &str) -> Result<Axis, String> {
    match value.to_ascii_lowercase().as_str() {
        "x" => Ok(Axis::X),
        "y" => Ok(Axis::Y),
        "z" => Ok(Axis::Z),
        other => {
            let index: usize = parse_number(other)?;
            Axis::try_from(index).map_err(|_| "expected 0, 1, 2 or x, y, z".to_string())
        }
    }
}

fn parse_bounds_factor(value: &str) -> Result<BoundsFactor, String> {
    let factors = value
        .split_whitespace()
        .map(parse_number::<f64>)
        .collect::<Result<Vec<_>, _>>()?;
    let factors: [f64; 6] = factors
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 6 factors, got {}", v.len()))?;
    if factors.iter().any(|f| !f.is_finite()) {
        return Err("factors must be finite".to_string());
    }
    Ok(BoundsFactor(factors))
}

fn parse_fields(value: &str) -> Result<Vec<FieldKind>, String> {
    let fields = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<FieldKind>, _>>()?;
    if fields.is_empty() {
        return Err("at least one field is required".to_string());
    }
    Ok(fields)
}
