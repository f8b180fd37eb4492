//! VTK XML image data (`.vti`) with ASCII point data.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use super::GridSink;
use crate::error::{OutputError, OutputResult};
use crate::field::Grid;

const VALUES_PER_LINE: usize = 6;

/// Indentation of value rows and of the closing `DataArray` tag.
const ROW_INDENT: &str = "          ";
const CLOSE_INDENT: &str = "        ";

/// Writes a grid as a VTK `ImageData` file.
///
/// Every field becomes a `Float64` point array; the first one is declared as
/// the active scalars.
///
/// # Example
///
/// ```
/// use mesh_porosity::{Axis, BoundsFactor, Grid, GridSink, ScalarField, VtiWriter};
/// use mesh_porosity::plan_grid_from_bounds;
///
/// let spec = plan_grid_from_bounds([0.0, 1.0, 0.0, 1.0, 0.0, 1.0], &BoundsFactor::default(), 1, Axis::X)?;
/// let mut grid = Grid::new(spec);
/// grid.attach(ScalarField::new("porosity", vec![0.5]))?;
///
/// let mut writer = VtiWriter::new(Vec::new());
/// writer.write_grid(&grid)?;
/// let xml = String::from_utf8(writer.into_inner())?;
/// assert!(xml.contains(r#"<PointData Scalars="porosity">"#));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct VtiWriter<W: Write> {
    out: W,
}

impl<W: Write> VtiWriter<W> {
    /// Write to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the destination.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl VtiWriter<BufWriter<File>> {
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

impl<W: Write> GridSink for VtiWriter<W> {
    fn write_grid(&mut self, grid: &Grid) -> OutputResult<()> {
        let Some(active) = grid.fields().first() else {
            return Err(OutputError::NoFields);
        };
        let spec = grid.spec();
        let [x0, x1, y0, y1, z0, z1] = spec.extent();
        let extent = format!("{x0} {x1} {y0} {y1} {z0} {z1}");
        let origin = spec.origin();
        let spacing = spec.spacing();
        let origin = format!("{} {} {}", origin.x, origin.y, origin.z);
        let spacing = format!("{} {} {}", spacing.x, spacing.y, spacing.z);

        let mut writer = Writer::new_with_indent(&mut self.out, b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
            .map_err(|e| OutputError::xml("declaration", e))?;

        let mut file = BytesStart::new("VTKFile");
        file.push_attribute(("type", "ImageData"));
        file.push_attribute(("version", "1.0"));
        file.push_attribute(("byte_order", "LittleEndian"));
        file.push_attribute(("header_type", "UInt64"));
        writer
            .write_event(Event::Start(file))
            .map_err(|e| OutputError::xml("VTKFile", e))?;

        let mut image = BytesStart::new("ImageData");
        image.push_attribute(("WholeExtent", extent.as_str()));
        image.push_attribute(("Origin", origin.as_str()));
        image.push_attribute(("Spacing", spacing.as_str()));
        image.push_attribute(("Direction", "1 0 0 0 1 0 0 0 1"));
        writer
            .write_event(Event::Start(image))
            .map_err(|e| OutputError::xml("ImageData", e))?;

        let mut piece = BytesStart::new("Piece");
        piece.push_attribute(("Extent", extent.as_str()));
        writer
            .write_event(Event::Start(piece))
            .map_err(|e| OutputError::xml("Piece", e))?;

        let mut point_data = BytesStart::new("PointData");
        point_data.push_attribute(("Scalars", active.name()));
        writer
            .write_event(Event::Start(point_data))
            .map_err(|e| OutputError::xml("PointData", e))?;

        for field in grid.fields() {
            let mut array = BytesStart::new("DataArray");
            array.push_attribute(("type", "Float64"));
            array.push_attribute(("Name", field.name()));
            array.push_attribute(("format", "ascii"));
            writer
                .write_event(Event::Start(array))
                .map_err(|e| OutputError::xml("DataArray", e))?;
            writer
                .write_event(Event::Text(BytesText::new(&value_rows(field.values()))))
                .map_err(|e| OutputError::xml("DataArray values", e))?;
            writer
                .write_event(Event::End(BytesEnd::new("DataArray")))
                .map_err(|e| OutputError::xml("DataArray", e))?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("PointData")))
            .map_err(|e| OutputError::xml("PointData", e))?;
        writer
            .write_event(Event::Empty(BytesStart::new("CellData")))
            .map_err(|e| OutputError::xml("CellData", e))?;
        writer
            .write_event(Event::End(BytesEnd::new("Piece")))
            .map_err(|e| OutputError::xml("Piece", e))?;
        writer
            .write_event(Event::End(BytesEnd::new("ImageData")))
            .map_err(|e| OutputError::xml("ImageData", e))?;
        writer
            .write_event(Event::End(BytesEnd::new("VTKFile")))
            .map_err(|e| OutputError::xml("VTKFile", e))?;

        self.out.write_all(b"\n")?;
        self.out.flush()?;

        info!(
            extent = %extent,
            fields = grid.fields().len(),
            "wrote VTI"
        );
        Ok(())
    }
}

/// Lay out array values as indented rows under a `DataArray` start tag.
fn value_rows(values: &[f64]) -> String {
    let mut text = String::new();
    for chunk in values.chunks(VALUES_PER_LINE) {
        text.push('\n');
        text.push_str(ROW_INDENT);
        for (i, value) in chunk.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            text.push_str(&value.to_string());
        }
    }
    text.push('\n');
    text.push_str(CLOSE_INDENT);
    text
}
