//! Loop configuration schema.

use serde::{Deserialize, Serialize};

/// One loop run: physics parameters, solver selection, heating and output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoopConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Simulated duration (s)
    pub total_time: f64,
    /// Nominal time step (s)
    pub tau: f64,
    /// Loop half-length (Mm)
    pub loop_length_megameters: f64,
    #[serde(default = "default_rka_error")]
    pub rka_error: f64,
    #[serde(default = "default_saturation_limit")]
    pub saturation_limit: f64,
    #[serde(default = "default_c1_cond0")]
    pub c1_cond0: f64,
    #[serde(default = "default_c1_rad0")]
    pub c1_rad0: f64,
    #[serde(default)]
    pub helium_to_hydrogen_ratio: f64,

    #[serde(default)]
    pub use_c1_loss_correction: bool,
    #[serde(default)]
    pub use_c1_grav_correction: bool,
    #[serde(default = "default_true")]
    pub use_power_law_radiative_losses: bool,
    #[serde(default)]
    pub use_spitzer_conductivity: bool,
    #[serde(default)]
    pub calculate_dem: bool,

    pub solver: SolverKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<usize>,
    pub output_filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radiation: Option<RadiationDef>,
    pub heating: HeatingDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dem: Option<DemDef>,
}

fn default_rka_error() -> f64 {
    1.0e-6
}

fn default_saturation_limit() -> f64 {
    1.0 / 6.0
}

fn default_c1_cond0() -> f64 {
    6.0
}

fn default_c1_rad0() -> f64 {
    0.6
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Euler,
    Rk4,
    Rka4,
}

/// Tabulated radiative losses, used when the power law is switched off.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiationDef {
    /// Two columns (log10 T, log10 Λ); relative paths resolve against the config file
    pub table_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatingDef {
    #[serde(default)]
    pub background: f64,
    /// Electron share of the heating in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<f64>,
    /// Alternative to `partition`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<HeatedSpeciesDef>,
    #[serde(default)]
    pub events: Vec<HeatingEventDef>,
}

impl HeatingDef {
    /// Electron share; electrons take everything unless told otherwise.
    pub fn resolved_partition(&self) -> f64 {
        match (self.partition, self.species) {
            (Some(p), _) => p,
            (None, Some(HeatedSpeciesDef::Electron)) | (None, None) => 1.0,
            (None, Some(HeatedSpeciesDef::Ion)) => 0.0,
            (None, Some(HeatedSpeciesDef::Equal)) => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeatedSpeciesDef {
    Electron,
    Ion,
    Equal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatingEventDef {
    pub shape: PulseShapeDef,
    pub start: f64,
    pub end: f64,
    pub magnitude: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PulseShapeDef {
    Triangle,
    Square,
    Gaussian,
}

/// DEM temperature grid in log10 T.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DemDef {
    pub log_temperature_min: f64,
    pub log_temperature_max: f64,
    pub log_temperature_step: f64,
}

impl Default for DemDef {
    fn default() -> Self {
        Self {
            log_temperature_min: 4.0,
            log_temperature_max: 8.5,
            log_temperature_step: 0.05,
        }
    }
}

impl LoopConfig {
    /// Constant-heating configuration with the stock coefficients.
    pub fn quiescent(loop_length_megameters: f64, heating_rate: f64, output_filename: &str) -> Self {
        Self {
            version: crate::validate::LATEST_VERSION,
            name: None,
            total_time: 5000.0,
            tau: 1.0,
            loop_length_megameters,
            rka_error: default_rka_error(),
            saturation_limit: default_saturation_limit(),
            c1_cond0: default_c1_cond0(),
            c1_rad0: default_c1_rad0(),
            helium_to_hydrogen_ratio: 0.0,
            use_c1_loss_correction: false,
            use_c1_grav_correction: false,
            use_power_law_radiative_losses: true,
            use_spitzer_conductivity: true,
            calculate_dem: false,
            solver: SolverKind::Rk4,
            max_steps: None,
            output_filename: output_filename.to_string(),
            radiation: None,
            heating: HeatingDef {
                background: heating_rate,
                partition: None,
                species: None,
                events: vec![],
            },
            dem: None,
        }
    }

    /// DEM grid, falling back to the default when none is configured.
    pub fn dem_bins(&self) -> DemDef {
        self.dem.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let yaml = r#"
version: 1
total_time: 100.0
tau: 1.0
loop_length_megameters: 40.0
solver: rka4
output_filename: out.txt
heating:
  background: 0.01
"#;
        let config: LoopConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.solver, SolverKind::Rka4);
        assert_eq!(config.rka_error, 1.0e-6);
        assert_eq!(config.c1_cond0, 6.0);
        assert!(config.use_power_law_radiative_losses);
        assert!(!config.calculate_dem);
        assert_eq!(config.heating.resolved_partition(), 1.0);
        assert_eq!(config.dem_bins(), DemDef::default());
    }

    #[test]
    fn unknown_solver_is_rejected() {
        let yaml = r#"
version: 1
total_time: 100.0
tau: 1.0
loop_length_megameters: 40.0
solver: leapfrog
output_filename: out.txt
heating: {}
"#;
        let err = serde_yaml::from_str::<LoopConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("leapfrog"));
    }

    #[test]
    fn species_sets_partition() {
        let mut heating = HeatingDef {
            background: 0.0,
            partition: None,
            species: Some(HeatedSpeciesDef::Ion),
            events: vec![],
        };
        assert_eq!(heating.resolved_partition(), 0.0);
        heating.species = Some(HeatedSpeciesDef::Equal);
        assert_eq!(heating.resolved_partition(), 0.5);
        heating.partition = Some(0.25);
        heating.species = None;
        assert_eq!(heating.resolved_partition(), 0.25);
    }

    #[test]
    fn events_parse_from_flow_style() {
        let yaml = "{ shape: gaussian, start: 10.0, end: 110.0, magnitude: 0.5 }";
        let event: HeatingEventDef = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(event.shape, PulseShapeDef::Gaussian);
        assert_eq!(event.end, 110.0);
    }
}
