//! Optically thin radiative loss models.

use crate::error::{PhysicsError, PhysicsResult};
use std::path::Path;

/// Radiative loss function Λ(T) (erg cm^3 s^-1).
///
/// Implementations must be thread-safe (Send + Sync) so independent loops can
/// share one model across worker threads.
pub trait RadiativeLoss: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Loss rate at `log_temperature = log10(T / K)`; never negative.
    fn loss_rate(&self, log_temperature: f64) -> f64;
}

/// Upper log T bound, coefficient χ and exponent α of each power-law segment.
const POWER_LAW_SEGMENTS: [(f64, f64, f64); 7] = [
    (4.97, 1.09e-31, 2.0),
    (5.67, 8.87e-17, -1.0),
    (6.18, 1.90e-22, 0.0),
    (6.55, 3.53e-13, -1.5),
    (6.90, 3.46e-25, 1.0 / 3.0),
    (7.63, 5.49e-16, -1.0),
    (f64::INFINITY, 1.96e-27, 0.5),
];

/// Piecewise power-law fit Λ(T) = χ T^α.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerLawRadiation;

impl PowerLawRadiation {
    pub fn new() -> Self {
        Self
    }
}

impl RadiativeLoss for PowerLawRadiation {
    fn name(&self) -> &str {
        "power-law"
    }

    fn loss_rate(&self, log_temperature: f64) -> f64 {
        let (_, chi, alpha) = POWER_LAW_SEGMENTS
            .iter()
            .copied()
            .find(|(upper, _, _)| log_temperature <= *upper)
            .unwrap_or(POWER_LAW_SEGMENTS[POWER_LAW_SEGMENTS.len() - 1]);
        chi * 10f64.powf(alpha * log_temperature)
    }
}

/// Tabulated loss function, linearly interpolated in (log T, log Λ).
///
/// Outside the table the end values are held constant.
#[derive(Debug, Clone)]
pub struct TabulatedRadiation {
    log_temperature: Vec<f64>,
    log_loss: Vec<f64>,
}

impl TabulatedRadiation {
    /// Build from (log10 T, log10 Λ) pairs; the points are sorted by temperature.
    pub fn new(mut points: Vec<(f64, f64)>) -> PhysicsResult<Self> {
        if points.len() < 2 {
            return Err(PhysicsError::InvalidArg {
                what: format!(
                    "radiative loss table needs at least two points, got {}",
                    points.len()
                ),
            });
        }
        if points.iter().any(|(t, l)| !t.is_finite() || !l.is_finite()) {
            return Err(PhysicsError::InvalidArg {
                what: "radiative loss table contains non-finite values".to_string(),
            });
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        if points.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(PhysicsError::InvalidArg {
                what: "radiative loss table has duplicate temperatures".to_string(),
            });
        }
        let (log_temperature, log_loss) = points.into_iter().unzip();
        Ok(Self {
            log_temperature,
            log_loss,
        })
    }

    /// Parse a whitespace separated two-column table. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn parse(content: &str, source: &Path) -> PhysicsResult<Self> {
        let mut points = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse_err = |message: String| PhysicsError::Parse {
                path: source.to_path_buf(),
                line: idx + 1,
                message,
            };
            let mut cols = line.split_whitespace();
            let (Some(t), Some(l), None) = (cols.next(), cols.next(), cols.next()) else {
                return Err(parse_err("expected two columns".to_string()));
            };
            let t: f64 = t.parse().map_err(|e| parse_err(format!("log T: {e}")))?;
            let l: f64 = l.parse().map_err(|e| parse_err(format!("log loss: {e}")))?;
            points.push((t, l));
        }
        Self::new(points)
    }

    pub fn from_path(path: &Path) -> PhysicsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| PhysicsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&content, path)?;
        tracing::debug!(
            path = %path.display(),
            points = table.len(),
            "loaded radiative loss table"
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.log_temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_temperature.is_empty()
    }
}

impl RadiativeLoss for TabulatedRadiation {
    fn name(&self) -> &str {
        "tabulated"
    }

    fn loss_rate(&self, log_temperature: f64) -> f64 {
        let xs = &self.log_temperature;
        let ys = &self.log_loss;
        let last = xs.len() - 1;
        if log_temperature <= xs[0] {
            return 10f64.powf(ys[0]);
        }
        if log_temperature >= xs[last] {
            return 10f64.powf(ys[last]);
        }
        // First knot strictly above the query
        let hi = xs.partition_point(|&x| x <= log_temperature);
        let lo = hi - 1;
        let w = (log_temperature - xs[lo]) / (xs[hi] - xs[lo]);
        10f64.powf(ys[lo] + w * (ys[hi] - ys[lo]))
    }
}
