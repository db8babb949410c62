//! Configuration loading, validation and introspection.

use std::path::{Path, PathBuf};

use cl_project::LoopConfig;
use cl_sim::{InitialConditionSolver, InitialConditions, LoopModel};

use crate::assemble::assemble;
use crate::error::{AppError, AppResult};

/// Derived quantities of a configuration, for display.
#[derive(Debug, Clone)]
pub struct LoopDescription {
    pub name: Option<String>,
    pub loop_length_cm: f64,
    pub boltzmann_correction: f64,
    pub ion_mass_correction: f64,
    pub solver: &'static str,
    pub radiation: String,
    pub estimated_steps: usize,
    pub heating_events: usize,
    pub initial: InitialConditions,
}

/// Load and validate a configuration file (YAML or JSON).
pub fn load_config(path: &Path) -> AppResult<LoopConfig> {
    if !path.exists() {
        return Err(AppError::ConfigFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(cl_project::load_config(path)?)
}

/// Directory relative table paths are resolved against.
pub fn config_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Build the model and solve the initial conditions without integrating.
pub fn describe(config: &LoopConfig, base_dir: &Path) -> AppResult<LoopDescription> {
    let setup = assemble(config, base_dir)?;
    let model = LoopModel::new(setup.params, setup.radiation.as_ref(), &setup.heating)?;
    let initial = InitialConditionSolver::default().solve(&model)?;

    Ok(LoopDescription {
        name: config.name.clone(),
        loop_length_cm: setup.params.loop_length,
        boltzmann_correction: setup.params.abundance.boltzmann_correction,
        ion_mass_correction: setup.params.abundance.ion_mass_correction,
        solver: setup.options.solver.name(),
        radiation: setup.radiation.name().to_string(),
        estimated_steps: setup.options.estimated_steps(),
        heating_events: setup.heating.events().len(),
        initial,
    })
}
