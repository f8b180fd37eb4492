//! Per-node mappings from signed distance to material fields.
//!
//! All three transforms are pure functions of the distance at one node, so
//! they run through the same [`Execution`] as distance sampling and produce
//! identical output for every strategy.

use std::fmt;

use tracing::debug;

use crate::error::{PorosityError, PorosityResult};
use crate::exec::Execution;
use crate::field::ScalarField;
use crate::grid::GridSpec;

/// Name of the smoothed porosity field.
pub const POROSITY: &str = "porosity";
/// Name of the three-band grayscale field.
pub const MULTIGRAYSCALE: &str = "multigrayscale";
/// Name of the hard occupancy field.
pub const BINARY: &str = "binary";

/// Tie-break added to `|d|` in the binary transform.
pub const BINARY_EPSILON: f64 = 1e-12;

/// A distance-to-value mapping with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldTransform {
    /// `0.5 * tanh(d / thickness) + 0.5`.
    Porosity {
        /// Distance scale of the transition, in mesh units.
        thickness: f64,
    },
    /// `0` below `-delta`, `1` above `delta`, `0.5 * (1 + d / 2)` between.
    Multigrayscale {
        /// Half-width of the graded band, in `(0, 1]`.
        delta: f64,
    },
    /// `round(0.49 + 0.5 * d / (|d| + ε))`: `1` outside, `0` inside and on
    /// the surface.
    Binary,
}

impl FieldTransform {
    /// Name of the field the transform produces.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Porosity { .. } => POROSITY,
            Self::Multigrayscale { .. } => MULTIGRAYSCALE,
            Self::Binary => BINARY,
        }
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// [`PorosityError::InvalidParameter`] for a thickness that is not a
    /// positive finite number, or a delta outside `(0, 1]`.
    pub fn validate(&self) -> PorosityResult<()> {
        match *self {
            Self::Porosity { thickness } => {
                if thickness.is_finite() && thickness > 0.0 {
                    Ok(())
                } else {
                    Err(PorosityError::invalid_parameter(
                        "thickness",
                        format!("must be positive and finite, got {thickness}"),
                    ))
                }
            }
            Self::Multigrayscale { delta } => {
                if delta > 0.0 && delta <= 1.0 {
                    Ok(())
                } else {
                    Err(PorosityError::invalid_parameter(
                        "delta",
                        format!("must lie in (0, 1], got {delta}"),
                    ))
                }
            }
            Self::Binary => Ok(()),
        }
    }

    /// Map one distance value. Parameters are assumed valid.
    #[must_use]
    pub fn value(&self, d: f64) -> f64 {
        match *self {
            Self::Porosity { thickness } => porosity_value(d, thickness),
            Self::Multigrayscale { delta } => multigrayscale_value(d, delta),
            Self::Binary => binary_value(d),
        }
    }

    /// Apply the transform to a distance field on `spec`.
    ///
    /// # Errors
    ///
    /// - [`PorosityError::InvalidParameter`] from [`validate`](Self::validate).
    /// - [`PorosityError::DimensionMismatch`] if `sdf` does not have one value
    ///   per node.
    /// - [`PorosityError::ThreadPool`].
    pub fn apply(
        &self,
        spec: &GridSpec,
        sdf: &ScalarField,
        execution: Execution,
    ) -> PorosityResult<ScalarField> {
        self.validate()?;
        sdf.check_len(spec)?;

        let transform = *self;
        let values = execution.map_values(sdf.values(), move |d| transform.value(d))?;
        debug!(field = self.field_name(), nodes = values.len(), "applied transform");
        Ok(ScalarField::new(self.field_name(), values))
    }
}

impl fmt::Display for FieldTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Porosity { thickness } => write!(f, "porosity (thickness {thickness})"),
            Self::Multigrayscale { delta } => write!(f, "multigrayscale (delta {delta})"),
            Self::Binary => f.write_str("binary"),
        }
    }
}

/// Smoothed porosity of one distance value.
///
/// # Example
///
/// ```
/// use mesh_porosity::porosity_value;
///
/// assert_eq!(porosity_value(0.0, 0.3), 0.5);
/// assert!(porosity_value(-10.0, 1.0) < 1e-8);
/// ```
#[must_use]
pub fn porosity_value(d: f64, thickness: f64) -> f64 {
    0.5 * (d / thickness).tanh() + 0.5
}

/// Three-band grayscale of one distance value.
#[must_use]
pub fn multigrayscale_value(d: f64, delta: f64) -> f64 {
    if d.abs() <= delta {
        0.5 * (1.0 + d / 2.0)
    } else if d < -delta {
        0.0
    } else {
        1.0
    }
}

/// Hard occupancy of one distance value.
///
/// `0.0` on the surface itself: the 0.49 bias rounds a zero distance down.
#[must_use]
pub fn binary_value(d: f64) -> f64 {
    // `+ 0.0` turns the -0.0 that rounding produces for small negatives into 0.0
    (0.49 + 0.5 * d / (d.abs() + BINARY_EPSILON)).round() + 0.0
}

/// Porosity field with the given transition thickness.
///
/// # Errors
///
/// See [`FieldTransform::apply`].
pub fn porosity(
    spec: &GridSpec,
    sdf: &ScalarField,
    thickness: f64,
    execution: Execution,
) -> PorosityResult<ScalarField> {
    FieldTransform::Porosity { thickness }.apply(spec, sdf, execution)
}

/// Multi-level grayscale field with band half-width `delta`.
///
/// # Errors
///
/// See [`FieldTransform::apply`].
pub fn multigrayscale(
    spec: &GridSpec,
    sdf: &ScalarField,
    delta: f64,
    execution: Execution,
) -> PorosityResult<ScalarField> {
    FieldTransform::Multigrayscale { delta }.apply(spec, sdf, execution)
}

/// Binary occupancy field.
///
/// # Errors
///
/// See [`FieldTransform::apply`].
pub fn binary(
    spec: &GridSpec,
    sdf: &ScalarField,
    execution: Execution,
) -> PorosityResult<ScalarField> {
    FieldTransform::Binary.apply(spec, sdf, execution)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::grid::{Axis, BoundsFactor, plan_grid_from_bounds};
    use approx::assert_relative_eq;

    /// 2x1x1 grid.
    fn pair_spec() -> GridSpec {
        plan_grid_from_bounds(
            [0.0, 2.0, 0.0, 1.0, 0.0, 1.0],
            &BoundsFactor::default(),
            2,
            Axis::X,
        )
        .unwrap()
    }

    #[test]
    fn porosity_midpoint_and_limits() {
        for t in [0.1, 1.0, 7.5, -2.0] {
            assert_eq!(porosity_value(0.0, t), 0.5);
        }
        assert_relative_eq!(porosity_value(1.0, 1.0), 0.5 * 1.0_f64.tanh() + 0.5);
        assert_relative_eq!(porosity_value(100.0, 1.0), 1.0);
        assert_relative_eq!(porosity_value(-100.0, 1.0), 0.0);
    }

    #[test]
    fn multigrayscale_bands() {
        assert_eq!(multigrayscale_value(0.0, 0.5), 0.5);
        assert_eq!(multigrayscale_value(0.5, 0.5), 0.625);
        assert_eq!(multigrayscale_value(-0.5, 0.5), 0.375);
        assert_eq!(multigrayscale_value(-0.51, 0.5), 0.0);
        assert_eq!(multigrayscale_value(0.51, 0.5), 1.0);
    }

    #[test]
    fn binary_threshold() {
        assert_eq!(binary_value(1.0), 1.0);
        assert_eq!(binary_value(-1.0), 0.0);
        assert_eq!(binary_value(0.0), 0.0);
        assert_eq!(binary_value(1e-9), 1.0);
        let tiny_negative = binary_value(-1e-9);
        assert_eq!(tiny_negative, 0.0);
        assert!(tiny_negative.is_sign_positive());
    }

    #[test]
    fn delta_must_lie_in_unit_interval() {
        let spec = pair_spec();
        let sdf = ScalarField::new("signedDistance", vec![-0.2, 0.2]);
        for delta in [0.0, 1.5, -0.2, f64::NAN] {
            match multigrayscale(&spec, &sdf, delta, Execution::Sequential) {
                Err(PorosityError::InvalidParameter { name, .. }) => assert_eq!(name, "delta"),
                other => panic!("delta {delta}: unexpected result {other:?}"),
            }
        }
        let field = multigrayscale(&spec, &sdf, 1.0, Execution::Sequential).unwrap();
        assert_eq!(field.name(), MULTIGRAYSCALE);
        assert_relative_eq!(field.values()[0], 0.45, epsilon = 1e-15);
        assert_relative_eq!(field.values()[1], 0.55, epsilon = 1e-15);
    }

    #[test]
    fn thickness_must_be_positive() {
        let spec = pair_spec();
        let sdf = ScalarField::new("signedDistance", vec![0.0, 0.0]);
        for thickness in [0.0, -1.0, f64::INFINITY] {
            assert!(matches!(
                porosity(&spec, &sdf, thickness, Execution::Sequential),
                Err(PorosityError::InvalidParameter {
                    name: "thickness",
                    ..
                })
            ));
        }
        let field = porosity(&spec, &sdf, 0.25, Execution::Sequential).unwrap();
        assert_eq!(field.values(), &[0.5, 0.5]);
    }

    #[test]
    fn short_field_is_rejected() {
        let spec = pair_spec();
        let sdf = ScalarField::new("signedDistance", vec![1.0]);
        for transform in [
            FieldTransform::Porosity { thickness: 1.0 },
            FieldTransform::Multigrayscale { delta: 0.5 },
            FieldTransform::Binary,
        ] {
            assert!(matches!(
                transform.apply(&spec, &sdf, Execution::default()),
                Err(PorosityError::DimensionMismatch {
                    expected: 2,
                    actual: 1,
                    ..
                })
            ));
        }
    }

    #[test]
    fn binary_field_from_grid() {
        let spec = pair_spec();
        let sdf = ScalarField::new("signedDistance", vec![-0.3, 0.3]);
        let field = binary(&spec, &sdf, Execution::Parallel { threads: 2 }).unwrap();
        assert_eq!(field.name(), BINARY);
        assert_eq!(field.values(), &[0.0, 1.0]);
    }

    #[test]
    fn display_names_parameters() {
        assert_eq!(
            FieldTransform::Porosity { thickness: 0.5 }.to_string(),
            "porosity (thickness 0.5)"
        );
        assert_eq!(FieldTransform::Binary.to_string(), "binary");
    }
}
