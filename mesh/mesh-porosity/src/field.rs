//! Named scalar arrays and the grid that owns them.

use crate::error::{PorosityError, PorosityResult};
use crate::grid::GridSpec;

/// A named array with one `f64` per grid node, in node order.
///
/// Values cannot be modified once the field exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
}

impl ScalarField {
    /// Create a field.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in node order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the field has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless the field has exactly one value per node of `spec`.
    pub(crate) fn check_len(&self, spec: &GridSpec) -> PorosityResult<()> {
        let expected = spec.node_count();
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(PorosityError::DimensionMismatch {
                field: self.name.clone(),
                expected,
                actual: self.values.len(),
            })
        }
    }
}

/// A grid description plus its named fields, in insertion order.
///
/// # Example
///
/// ```
/// use mesh_porosity::{Axis, BoundsFactor, Grid, ScalarField, plan_grid_from_bounds};
///
/// let bounds = [0.0, 2.0, 0.0, 2.0, 0.0, 2.0];
/// let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 2, Axis::X)?;
/// let mut grid = Grid::new(spec);
///
/// grid.attach(ScalarField::new("ones", vec![1.0; 8]))?;
/// assert!(grid.attach(ScalarField::new("short", vec![1.0; 7])).is_err());
/// assert_eq!(grid.field("ones").map(ScalarField::len), Some(8));
/// # Ok::<(), mesh_porosity::PorosityError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Grid {
    spec: GridSpec,
    fields: Vec<ScalarField>,
}

impl Grid {
    /// Create a grid with no fields.
    #[must_use]
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            fields: Vec::new(),
        }
    }

    /// Grid geometry.
    #[must_use]
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Attach a field after the existing ones.
    ///
    /// # Errors
    ///
    /// - [`PorosityError::DimensionMismatch`] if the field length is not the
    ///   node count.
    /// - [`PorosityError::DuplicateField`] if the name is taken.
    pub fn attach(&mut self, field: ScalarField) -> PorosityResult<()> {
        field.check_len(&self.spec)?;
        if self.field(field.name()).is_some() {
            return Err(PorosityError::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ScalarField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// All fields, in the order they were attached.
    #[must_use]
    pub fn fields(&self) -> &[ScalarField] {
        &self.fields
    }

    /// Field names, in the order they were attached.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(ScalarField::name)
    }

    /// Whether at least one field is attached.
    #[must_use]
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::grid::{Axis, BoundsFactor, plan_grid_from_bounds};

    fn small_grid() -> Grid {
        let bounds = [0.0, 3.0, 0.0, 2.0, 0.0, 1.0];
        let spec = plan_grid_from_bounds(bounds, &BoundsFactor::default(), 3, Axis::X).unwrap();
        Grid::new(spec)
    }

    #[test]
    fn attach_keeps_insertion_order() {
        let mut grid = small_grid();
        for name in ["b", "a", "c"] {
            grid.attach(ScalarField::new(name, vec![0.0; 6])).unwrap();
        }
        assert_eq!(grid.field_names().collect::<Vec<_>>(), ["b", "a", "c"]);
        assert!(grid.has_fields());
    }

    #[test]
    fn attach_rejects_short_field() {
        let mut grid = small_grid();
        match grid.attach(ScalarField::new("short", vec![0.0; 5])) {
            Err(PorosityError::DimensionMismatch {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "short");
                assert_eq!(expected, 6);
                assert_eq!(actual, 5);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!grid.has_fields());
    }

    #[test]
    fn attach_rejects_duplicate_name() {
        let mut grid = small_grid();
        grid.attach(ScalarField::new("porosity", vec![0.0; 6])).unwrap();
        assert!(matches!(
            grid.attach(ScalarField::new("porosity", vec![1.0; 6])),
            Err(PorosityError::DuplicateField(name)) if name == "porosity"
        ));
        assert_eq!(grid.fields().len(), 1);
        assert_eq!(grid.field("porosity").unwrap().values()[0], 0.0);
    }

    #[test]
    fn missing_field_lookup() {
        assert!(small_grid().field("porosity").is_none());
    }
}
