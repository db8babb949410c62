//! Differential emission measure (DEM) diagnostics.
//!
//! The DEM is derived from the integrated state and never feeds back into the
//! equations, so accumulation is strictly a side channel of the time loop.

use crate::closure::ClosureCoefficients;
use crate::error::{PhysicsError, PhysicsResult};
use crate::radiation::RadiativeLoss;
use cl_core::constants::{BOLTZMANN_CONSTANT, SPITZER_ELECTRON_CONDUCTIVITY};
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Collector fed once per completed step.
pub trait DemAccumulator {
    fn accumulate(
        &mut self,
        step: usize,
        pressure_e: f64,
        density: f64,
        electron_flux: f64,
        c1: f64,
    );

    /// Write the accumulated rows next to `output`, dropping the last `trim` rows.
    fn export(&self, output: &Path, trim: usize) -> PhysicsResult<()>;
}

/// Uniform grid in log10 T.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemBins {
    pub log_temperature_min: f64,
    pub log_temperature_max: f64,
    pub log_temperature_step: f64,
}

impl DemBins {
    pub fn validate(&self) -> PhysicsResult<()> {
        let DemBins {
            log_temperature_min: lo,
            log_temperature_max: hi,
            log_temperature_step: step,
        } = *self;
        if !(lo.is_finite() && hi.is_finite() && step.is_finite()) || step <= 0.0 || hi <= lo {
            return Err(PhysicsError::InvalidArg {
                what: format!("DEM bins must satisfy min < max and step > 0 (min={lo}, max={hi}, step={step})"),
            });
        }
        Ok(())
    }

    /// Bin centres in log10 T, ascending.
    pub fn centers(&self) -> Vec<f64> {
        let count = ((self.log_temperature_max - self.log_temperature_min)
            / self.log_temperature_step
            + 1e-9)
            .floor() as usize
            + 1;
        (0..count)
            .map(|i| self.log_temperature_min + i as f64 * self.log_temperature_step)
            .collect()
    }
}

/// Coronal and transition-region DEM on a fixed temperature grid, one row per step.
pub struct BinnedDem<'a> {
    log_temperature: Vec<f64>,
    temperature: Vec<f64>,
    /// Linear width of each bin (K)
    width: Vec<f64>,
    loop_length: f64,
    radiation: &'a dyn RadiativeLoss,
    /// Nominal row count; export pads stored rows with zeros up to this
    expected_rows: usize,
    corona: Vec<Vec<f64>>,
    transition_region: Vec<Vec<f64>>,
}

impl<'a> BinnedDem<'a> {
    /// Rows are stored as steps arrive; `expected_rows` is the nominal count
    /// that export measures its trim against.
    pub fn new(
        bins: DemBins,
        loop_length: f64,
        radiation: &'a dyn RadiativeLoss,
        expected_rows: usize,
    ) -> PhysicsResult<Self> {
        bins.validate()?;
        let log_temperature = bins.centers();
        let temperature: Vec<f64> = log_temperature.iter().map(|lt| 10f64.powf(*lt)).collect();
        let width = temperature
            .iter()
            .map(|t| t * std::f64::consts::LN_10 * bins.log_temperature_step)
            .collect();
        Ok(Self {
            log_temperature,
            temperature,
            width,
            loop_length,
            radiation,
            expected_rows,
            corona: Vec::new(),
            transition_region: Vec::new(),
        })
    }

    pub fn log_temperature(&self) -> &[f64] {
        &self.log_temperature
    }

    pub fn corona(&self) -> &[Vec<f64>] {
        &self.corona
    }

    pub fn transition_region(&self) -> &[Vec<f64>] {
        &self.transition_region
    }

    fn corona_row(&self, temperature: f64, density: f64) -> Vec<f64> {
        let apex = temperature / ClosureCoefficients::c2();
        let base = ClosureCoefficients::c3() * apex;
        let value = 2.0 * density * density * self.loop_length / (apex - base);
        self.temperature
            .iter()
            .map(|&t| if t >= base && t <= apex { value } else { 0.0 })
            .collect()
    }

    /// Conduction-radiation balance below the coronal base, scaled so the
    /// transition region radiates C1 times the coronal losses.
    fn transition_region_row(
        &self,
        temperature: f64,
        pressure_e: f64,
        density: f64,
        electron_flux: f64,
        c1: f64,
    ) -> Vec<f64> {
        let kappa = SPITZER_ELECTRON_CONDUCTIVITY;
        let base = ClosureCoefficients::c3() * temperature / ClosureCoefficients::c2();
        let p_over_k = pressure_e / BOLTZMANN_CONSTANT;
        let integrand = |t: f64| self.radiation.loss_rate(t.log10()) * t.sqrt();

        let mut row = vec![0.0; self.temperature.len()];
        let below = self.temperature.partition_point(|&t| t < base);
        let mut integral = 0.0;
        let (mut upper_t, mut upper_g) = (base, integrand(base));
        for i in (0..below).rev() {
            let t = self.temperature[i];
            let g = integrand(t);
            integral += 0.5 * (g + upper_g) * (upper_t - t);
            (upper_t, upper_g) = (t, g);

            let flux_2 = electron_flux * electron_flux - 2.0 * kappa * p_over_k * p_over_k * integral;
            if flux_2 > 0.0 {
                let n_b = p_over_k / t;
                row[i] = 2.0 * n_b * n_b * kappa * t.powf(2.5) / flux_2.sqrt();
            }
        }

        let emitted: f64 = row
            .iter()
            .zip(&self.temperature)
            .zip(&self.width)
            .map(|((dem, &t), dt)| dem * self.radiation.loss_rate(t.log10()) * dt)
            .sum();
        let target = 2.0
            * c1
            * density
            * density
            * self.radiation.loss_rate(temperature.log10())
            * self.loop_length;
        if emitted > 0.0 && target.is_finite() {
            let scale = target / emitted;
            row.iter_mut().for_each(|v| *v *= scale);
        }
        row
    }

    fn store(rows: &mut Vec<Vec<f64>>, step: usize, row: Vec<f64>) {
        if step < rows.len() {
            rows[step] = row;
        } else {
            let width = row.len();
            rows.resize(step, vec![0.0; width]);
            rows.push(row);
        }
    }

    /// Write the first `keep` rows, zero-filled past the last stored step.
    fn write_table(&self, path: &Path, rows: &[Vec<f64>], keep: usize) -> PhysicsResult<()> {
        let io_err = |source| PhysicsError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut w = BufWriter::new(file);
        let header: Vec<String> = self.log_temperature.iter().map(|v| v.to_string()).collect();
        writeln!(w, "{}", header.join("\t")).map_err(io_err)?;
        let stored = keep.min(rows.len());
        for row in &rows[..stored] {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            writeln!(w, "{}", line.join("\t")).map_err(io_err)?;
        }
        if keep > stored {
            let zeros = vec!["0"; self.log_temperature.len()].join("\t");
            for _ in stored..keep {
                writeln!(w, "{zeros}").map_err(io_err)?;
            }
        }
        w.flush().map_err(io_err)
    }
}

/// `<output>.<suffix>`, keeping any extension `output` already has.
pub fn sibling_path(output: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

impl DemAccumulator for BinnedDem<'_> {
    fn accumulate(
        &mut self,
        step: usize,
        pressure_e: f64,
        density: f64,
        electron_flux: f64,
        c1: f64,
    ) {
        let temperature = pressure_e / (BOLTZMANN_CONSTANT * density);
        let corona = self.corona_row(temperature, density);
        let tr = self.transition_region_row(temperature, pressure_e, density, electron_flux, c1);
        Self::store(&mut self.corona, step, corona);
        Self::store(&mut self.transition_region, step, tr);
    }

    fn export(&self, output: &Path, trim: usize) -> PhysicsResult<()> {
        let keep = self
            .expected_rows
            .max(self.corona.len())
            .saturating_sub(trim);
        self.write_table(&sibling_path(output, "dem_corona"), &self.corona, keep)?;
        self.write_table(&sibling_path(output, "dem_tr"), &self.transition_region, keep)?;
        tracing::debug!(output = %output.display(), rows = keep, "exported DEM");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radiation::PowerLawRadiation;

    fn bins() -> DemBins {
        DemBins {
            log_temperature_min: 4.0,
            log_temperature_max: 8.0,
            log_temperature_step: 0.05,
        }
    }

    #[test]
    fn bin_centres_cover_range() {
        let c = bins().centers();
        assert_eq!(c.len(), 81);
        assert!((c[0] - 4.0).abs() < 1e-12);
        assert!((c[80] - 8.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_inverted_bins() {
        let b = DemBins {
            log_temperature_min: 7.0,
            log_temperature_max: 5.0,
            log_temperature_step: 0.1,
        };
        assert!(b.validate().is_err());
    }

    #[test]
    fn corona_dem_spans_base_to_apex() {
        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 2).unwrap();
        let n = 1.0e9;
        let t = 3.0e6;
        let pe = BOLTZMANN_CONSTANT * n * t;
        dem.accumulate(1, pe, n, -1.0e7, 2.0);

        let apex = t / 0.9;
        let base = 0.6 * apex;
        let row = &dem.corona()[1];
        for (lt, v) in dem.log_temperature().iter().zip(row) {
            let tb = 10f64.powf(*lt);
            if tb >= base && tb <= apex {
                assert!(*v > 0.0);
            } else {
                assert_eq!(*v, 0.0);
            }
        }
        // Row 0 untouched
        assert!(dem.corona()[0].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn transition_region_radiates_c1_times_corona() {
        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 1).unwrap();
        let n = 1.0e9;
        let t = 2.0e6;
        let pe = BOLTZMANN_CONSTANT * n * t;
        // Strong flux keeps F^2 positive through the whole transition region
        let fe = -1.0e9;
        let c1 = 2.0;
        dem.accumulate(0, pe, n, fe, c1);

        let row = &dem.transition_region()[0];
        assert!(row.iter().any(|v| *v > 0.0));
        let emitted: f64 = row
            .iter()
            .zip(&dem.temperature)
            .zip(&dem.width)
            .map(|((d, &tb), w)| d * rad.loss_rate(tb.log10()) * w)
            .sum();
        let target = 2.0 * c1 * n * n * rad.loss_rate(t.log10()) * 4.0e9;
        assert!((emitted - target).abs() < 1e-9 * target);
    }

    #[test]
    fn accumulate_past_estimate_appends() {
        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 1).unwrap();
        dem.accumulate(3, BOLTZMANN_CONSTANT * 1.0e9 * 1.0e6, 1.0e9, -1.0e6, 2.0);
        assert_eq!(dem.corona().len(), 4);
        assert_eq!(dem.transition_region().len(), 4);
    }

    #[test]
    fn rows_are_allocated_on_demand() {
        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 1_000_000).unwrap();
        assert!(dem.corona().is_empty());
        assert!(dem.transition_region().is_empty());
        dem.accumulate(2, BOLTZMANN_CONSTANT * 1.0e9 * 1.0e6, 1.0e9, -1.0e6, 2.0);
        assert_eq!(dem.corona().len(), 3);
        assert!(dem.corona.capacity() < 1_000);
    }

    #[test]
    fn export_pads_rows_up_to_the_estimate() {
        let dir = std::env::temp_dir().join("cl_physics_dem_export_padded");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("loop.txt");

        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 10).unwrap();
        for step in 1..4 {
            dem.accumulate(step, BOLTZMANN_CONSTANT * 1.0e9 * 1.0e6, 1.0e9, -1.0e6, 2.0);
        }
        dem.export(&output, 4).unwrap();

        let corona = std::fs::read_to_string(sibling_path(&output, "dem_corona")).unwrap();
        let rows: Vec<&str> = corona.lines().skip(1).collect();
        assert_eq!(rows.len(), 6);
        let is_zero = |line: &str| line.split('\t').all(|v| v.parse::<f64>().unwrap() == 0.0);
        assert!(is_zero(rows[0]));
        assert!(!is_zero(rows[1]));
        assert!(rows[4..].iter().all(|r| is_zero(r)));
        assert!(rows.iter().all(|r| r.split('\t').count() == 81));
    }

    #[test]
    fn export_trims_unused_rows() {
        let dir = std::env::temp_dir().join("cl_physics_dem_export");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("loop.txt");

        let rad = PowerLawRadiation::new();
        let mut dem = BinnedDem::new(bins(), 4.0e9, &rad, 5).unwrap();
        for step in 0..3 {
            dem.accumulate(step, BOLTZMANN_CONSTANT * 1.0e9 * 1.0e6, 1.0e9, -1.0e6, 2.0);
        }
        dem.export(&output, 2).unwrap();

        let corona = std::fs::read_to_string(sibling_path(&output, "dem_corona")).unwrap();
        let tr = std::fs::read_to_string(dir.join("loop.txt.dem_tr")).unwrap();
        // Header plus three retained rows
        assert_eq!(corona.lines().count(), 4);
        assert_eq!(tr.lines().count(), 4);
        assert_eq!(corona.lines().next().unwrap().split('\t').count(), 81);
    }
}
