//! Per-step results buffer.

/// One recorded step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRow {
    pub time: f64,
    pub heat: f64,
    pub temperature_e: f64,
    pub temperature_i: f64,
    pub pressure_e: f64,
    pub pressure_i: f64,
    pub density: f64,
}

/// Parallel per-quantity series, all of equal length.
///
/// Sized up front from the nominal step count; rows past the estimate are
/// appended, and `finalize` releases whatever the run did not use.
#[derive(Debug, Clone, Default)]
pub struct LoopResults {
    pub time: Vec<f64>,
    pub heat: Vec<f64>,
    pub temperature_e: Vec<f64>,
    pub temperature_i: Vec<f64>,
    pub pressure_e: Vec<f64>,
    pub pressure_i: Vec<f64>,
    pub density: Vec<f64>,
    estimate: usize,
}

impl LoopResults {
    pub fn with_estimate(estimate: usize) -> Self {
        Self {
            time: Vec::with_capacity(estimate),
            heat: Vec::with_capacity(estimate),
            temperature_e: Vec::with_capacity(estimate),
            temperature_i: Vec::with_capacity(estimate),
            pressure_e: Vec::with_capacity(estimate),
            pressure_i: Vec::with_capacity(estimate),
            density: Vec::with_capacity(estimate),
            estimate,
        }
    }

    pub fn push(&mut self, row: LoopRow) {
        self.time.push(row.time);
        self.heat.push(row.heat);
        self.temperature_e.push(row.temperature_e);
        self.temperature_i.push(row.temperature_i);
        self.pressure_e.push(row.pressure_e);
        self.pressure_i.push(row.pressure_i);
        self.density.push(row.density);
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<LoopRow> {
        Some(LoopRow {
            time: *self.time.get(i)?,
            heat: self.heat[i],
            temperature_e: self.temperature_e[i],
            temperature_i: self.temperature_i[i],
            pressure_e: self.pressure_e[i],
            pressure_i: self.pressure_i[i],
            density: self.density[i],
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = LoopRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    pub fn last(&self) -> Option<LoopRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Release unused capacity. Returns how many estimated rows went unused.
    pub fn finalize(&mut self) -> usize {
        let trim = self.estimate.saturating_sub(self.len());
        for series in [
            &mut self.time,
            &mut self.heat,
            &mut self.temperature_e,
            &mut self.temperature_i,
            &mut self.pressure_e,
            &mut self.pressure_i,
            &mut self.density,
        ] {
            series.shrink_to_fit();
        }
        trim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: f64) -> LoopRow {
        LoopRow {
            time,
            heat: 0.01,
            temperature_e: 1e6,
            temperature_i: 1e6,
            pressure_e: 0.1,
            pressure_i: 0.1,
            density: 1e9,
        }
    }

    #[test]
    fn series_stay_aligned() {
        let mut r = LoopResults::with_estimate(2);
        r.push(row(0.0));
        r.push(row(1.0));
        r.push(row(2.0));
        assert_eq!(r.len(), 3);
        assert_eq!(r.density.len(), 3);
        assert_eq!(r.row(2), Some(row(2.0)));
        assert_eq!(r.row(3), None);
        assert_eq!(r.last().map(|l| l.time), Some(2.0));
        assert_eq!(r.finalize(), 0);
    }

    #[test]
    fn finalize_reports_unused_tail() {
        let mut r = LoopResults::with_estimate(10);
        for i in 0..4 {
            r.push(row(i as f64));
        }
        assert_eq!(r.finalize(), 6);
        assert_eq!(r.rows().count(), 4);
    }
}
