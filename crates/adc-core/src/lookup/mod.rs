//! The ZA→ADC lookup table: loading, validation, and interpolated
//! evaluation (§4.4.1, §6).

mod interpolate;

use std::path::Path;

pub use interpolate::{Akima, CubicSpline, Interpolator, InterpolationMethod, Pchip};

use crate::constants::LOOKUP_MIN_ROWS;

/// An ordered `(za_deg, adc_deg)` table defining `fn_za_adc`, the monotone
/// 1-D mapping from zenith angle to prism angle used by `activate` (§3).
#[derive(Debug, Clone)]
pub struct LookupTable {
    za: Vec<f64>,
    adc: Vec<f64>,
}

impl LookupTable {
    /// Builds a table from already-parsed rows, validating row count and
    /// monotonicity (§6: `>= 4` rows, non-decreasing `za_deg`).
    pub fn from_rows(rows: Vec<(f64, f64)>) -> Result<Self, LookupError> {
        if rows.len() < LOOKUP_MIN_ROWS {
            return Err(LookupError::TooFewRows { found: rows.len() });
        }
        if rows.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err(LookupError::NotMonotone);
        }
        let (za, adc) = rows.into_iter().unzip();
        Ok(Self { za, adc })
    }

    /// Loads and validates a lookup table from a `#`-comment-tolerant,
    /// two-column `za_deg, adc_deg` text file (§6).
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let contents = std::fs::read_to_string(path)?;
        let mut rows = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, ',');
            let za = parts
                .next()
                .ok_or_else(|| LookupError::Parse { line: line_no + 1 })?
                .trim()
                .parse::<f64>()
                .map_err(|_| LookupError::Parse { line: line_no + 1 })?;
            let adc = parts
                .next()
                .ok_or_else(|| LookupError::Parse { line: line_no + 1 })?
                .trim()
                .parse::<f64>()
                .map_err(|_| LookupError::Parse { line: line_no + 1 })?;
            rows.push((za, adc));
        }
        Self::from_rows(rows)
    }

    /// The lowest `za_deg` this table is defined for.
    #[must_use]
    pub fn za_min(&self) -> f64 {
        self.za[0]
    }

    /// The highest `za_deg` this table is defined for.
    #[must_use]
    pub fn za_max(&self) -> f64 {
        self.za[self.za.len() - 1]
    }

    /// Evaluates `fn_za_adc(za)` using `method`, rejecting `za` outside
    /// `[za_min, za_max]` before any interpolator is even built (§4.4.1: out
    /// of bounds fails before any motor motion).
    pub fn evaluate(&self, za: f64, method: InterpolationMethod) -> Result<f64, LookupError> {
        if za < self.za_min() || za > self.za_max() {
            return Err(LookupError::OutOfBounds(za));
        }
        let xs = self.za.clone();
        let ys = self.adc.clone();
        let value = match method {
            InterpolationMethod::Pchip => Pchip::new(xs, ys).evaluate(za),
            InterpolationMethod::Cubic => CubicSpline::new(xs, ys).evaluate(za),
            InterpolationMethod::Akima => Akima::new(xs, ys).evaluate(za),
        };
        Ok(value)
    }
}

/// Failure loading or evaluating a [`LookupTable`].
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The lookup table file could not be read.
    #[error("lookup table io error: {0}")]
    Io(#[from] std::io::Error),
    /// A data line did not parse as two comma-separated floats.
    #[error("lookup table parse error at line {line}")]
    Parse {
        /// 1-indexed source line.
        line: usize,
    },
    /// Fewer than [`LOOKUP_MIN_ROWS`] data rows were present.
    #[error("lookup table has too few rows: found {found}, need at least {LOOKUP_MIN_ROWS}")]
    TooFewRows {
        /// Number of data rows actually found.
        found: usize,
    },
    /// `za_deg` was not non-decreasing across rows.
    #[error("lookup table is not monotone in za_deg")]
    NotMonotone,
    /// `activate`/`calc_from_za` was evaluated outside the table's domain.
    #[error("za {0} is outside the lookup table domain")]
    OutOfBounds(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> LookupTable {
        LookupTable::from_rows(vec![(0.0, 0.0), (10.0, 20.0), (20.0, 40.0), (30.0, 60.0)]).unwrap()
    }

    #[test]
    fn too_few_rows_is_rejected() {
        let err = LookupTable::from_rows(vec![(0.0, 0.0), (1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, LookupError::TooFewRows { found: 2 }));
    }

    #[test]
    fn non_monotone_za_is_rejected() {
        let err = LookupTable::from_rows(vec![
            (0.0, 0.0),
            (10.0, 20.0),
            (5.0, 30.0),
            (30.0, 60.0),
        ])
        .unwrap_err();
        assert!(matches!(err, LookupError::NotMonotone));
    }

    #[test]
    fn out_of_bounds_za_is_rejected_before_interpolating() {
        let table = table();
        let err = table.evaluate(31.0, InterpolationMethod::Pchip).unwrap_err();
        assert!(matches!(err, LookupError::OutOfBounds(za) if za == 31.0));
    }

    #[test]
    fn in_bounds_za_interpolates_linear_data_exactly() {
        let table = table();
        let adc_deg = table.evaluate(15.0, InterpolationMethod::Pchip).unwrap();
        assert!((adc_deg - 30.0).abs() < 1e-9);
    }

    #[test]
    fn comment_lines_and_whitespace_are_tolerated() {
        let dir = std::env::temp_dir().join("adc-core-lookup-test.csv");
        std::fs::write(
            &dir,
            "# za_deg, adc_deg\n0, 0\n10, 20\n20, 40\n30, 60\n# trailing comment\n",
        )
        .unwrap();
        let table = LookupTable::load_csv(&dir).unwrap();
        assert_eq!(table.za_min(), 0.0);
        assert_eq!(table.za_max(), 30.0);
        std::fs::remove_file(&dir).ok();
    }
}
