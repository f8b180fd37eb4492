//! Grid sinks.
//!
//! A sink receives a finished [`Grid`] and writes it somewhere. Both writers
//! accept any [`std::io::Write`], and `create` opens a buffered file.

mod csv;
mod vti;

pub use csv::CsvWriter;
pub use vti::VtiWriter;

use crate::error::OutputResult;
use crate::field::Grid;

/// Destination for a completed grid.
pub trait GridSink {
    /// Write the grid geometry and every field.
    ///
    /// # Errors
    ///
    /// [`OutputError::NoFields`](crate::OutputError::NoFields) for a grid
    /// without fields, or an I/O error from the destination.
    fn write_grid(&mut self, grid: &Grid) -> OutputResult<()>;
}

impl<S: GridSink + ?Sized> GridSink for &mut S {
    fn write_grid(&mut self, grid: &Grid) -> OutputResult<()> {
        (**self).write_grid(grid)
    }
}

impl<S: GridSink + ?Sized> GridSink for Box<S> {
    fn write_grid(&mut self, grid: &Grid) -> OutputResult<()> {
        (**self).write_grid(grid)
    }
}
