//! Plain-text node table.
//!
//! ```text
//! nx,ny,nz
//! ix,iy,iz,value[,value...]
//! ```
//!
//! One row per node in node order, one value per field in grid order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use super::GridSink;
use crate::error::{OutputError, OutputResult};
use crate::field::Grid;

/// Writes a grid as a CSV node table.
#[derive(Debug)]
pub struct CsvWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvWriter<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the destination.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl CsvWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    ///
    /// # Errors
    ///
    /// [`OutputError::Create`] if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> GridSink for CsvWriter<W> {
    fn write_grid(&mut self, grid: &Grid) -> OutputResult<()> {
        if !grid.has_fields() {
            return Err(OutputError::NoFields);
        }
        let spec = grid.spec();
        let [nx, ny, nz] = spec.dimensions();
        writeln!(self.out, "{nx},{ny},{nz}")?;

        let fields = grid.fields();
        for n in 0..spec.node_count() {
            let [i, j, k] = spec.node_coords(n);
            write!(self.out, "{i},{j},{k}")?;
            for field in fields {
                write!(self.out, ",{}", field.values()[n])?;
            }
            writeln!(self.out)?;
        }
        self.out.flush()?;

        info!(nodes = spec.node_count(), fields = fields.len(), "wrote CSV");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::output::test_support::two_field_grid;

    #[test]
    fn writes_header_and_rows() {
        let mut writer = CsvWriter::new(Vec::new());
        writer.write_grid(&two_field_grid()).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "2,2,1\n0,0,0,0.25,0\n1,0,0,0.5,0\n0,1,0,0.75,1\n1,1,0,1,1\n"
        );
    }

    #[test]
    fn empty_grid_is_refused() {
        let grid = Grid::new(two_field_grid().spec().clone());
        let mut writer = CsvWriter::new(Vec::new());
        assert!(matches!(writer.write_grid(&grid), Err(OutputError::NoFields)));
        assert!(writer.into_inner().is_empty());
    }

    #[test]
    fn create_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.csv");
        assert!(matches!(
            CsvWriter::create(&path),
            Err(OutputError::Create { .. })
        ));
    }
}
