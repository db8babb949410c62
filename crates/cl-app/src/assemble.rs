//! Build physics collaborators and run options from a loop configuration.

use std::path::{Path, PathBuf};

use cl_core::units::{megameters, to_cm};
use cl_physics::{
    AbundanceCorrection, DemBins, EventHeating, HeatingEvent, LoopParameters, PowerLawRadiation,
    PulseShape, RadiativeLoss, TabulatedRadiation,
};
use cl_project::{LoopConfig, PulseShapeDef, SolverKind};
use cl_sim::{SimOptions, Solver};

use crate::error::{AppError, AppResult};

/// Everything a run needs, resolved from one configuration.
pub struct LoopSetup {
    pub params: LoopParameters,
    pub options: SimOptions,
    pub heating: EventHeating,
    pub radiation: Box<dyn RadiativeLoss>,
    pub dem_bins: Option<DemBins>,
    pub output_path: PathBuf,
}

/// `base_dir` anchors relative table paths (normally the configuration's directory).
pub fn assemble(config: &LoopConfig, base_dir: &Path) -> AppResult<LoopSetup> {
    let params = loop_parameters(config)?;
    let heating = build_heating(config)?;
    let radiation = build_radiation(config, base_dir)?;
    let dem_bins = if config.calculate_dem {
        let bins = dem_bins(config);
        bins.validate()?;
        Some(bins)
    } else {
        None
    };

    tracing::debug!(
        loop_length_cm = params.loop_length,
        boltzmann_correction = params.abundance.boltzmann_correction,
        ion_mass_correction = params.abundance.ion_mass_correction,
        radiation = radiation.name(),
        "assembled loop"
    );

    Ok(LoopSetup {
        params,
        options: sim_options(config),
        heating,
        radiation,
        dem_bins,
        output_path: PathBuf::from(&config.output_filename),
    })
}

pub fn loop_parameters(config: &LoopConfig) -> AppResult<LoopParameters> {
    let params = LoopParameters {
        loop_length: to_cm(megameters(config.loop_length_megameters)),
        saturation_limit: config.saturation_limit,
        c1_cond0: config.c1_cond0,
        c1_rad0: config.c1_rad0,
        use_c1_loss_correction: config.use_c1_loss_correction,
        use_c1_grav_correction: config.use_c1_grav_correction,
        use_spitzer_conductivity: config.use_spitzer_conductivity,
        abundance: AbundanceCorrection::from_helium_ratio(config.helium_to_hydrogen_ratio)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn solver(kind: SolverKind) -> Solver {
    match kind {
        SolverKind::Euler => Solver::Euler,
        SolverKind::Rk4 => Solver::Rk4,
        SolverKind::Rka4 => Solver::Rka4,
    }
}

pub fn sim_options(config: &LoopConfig) -> SimOptions {
    SimOptions {
        total_time: config.total_time,
        tau: config.tau,
        rka_error: config.rka_error,
        solver: solver(config.solver),
        max_steps: config.max_steps,
    }
}

pub fn build_heating(config: &LoopConfig) -> AppResult<EventHeating> {
    let events = config
        .heating
        .events
        .iter()
        .map(|e| {
            let shape = match e.shape {
                PulseShapeDef::Triangle => PulseShape::Triangle,
                PulseShapeDef::Square => PulseShape::Square,
                PulseShapeDef::Gaussian => PulseShape::Gaussian,
            };
            HeatingEvent::new(shape, e.start, e.end, e.magnitude)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(EventHeating::new(
        config.heating.background,
        config.heating.resolved_partition(),
        events,
    )?)
}

pub fn build_radiation(config: &LoopConfig, base_dir: &Path) -> AppResult<Box<dyn RadiativeLoss>> {
    if config.use_power_law_radiative_losses {
        return Ok(Box::new(PowerLawRadiation::new()));
    }
    let table = config.radiation.as_ref().ok_or_else(|| {
        AppError::InvalidInput(
            "radiation.table_path is required when power-law losses are disabled".to_string(),
        )
    })?;
    let path = resolve_path(base_dir, &table.table_path);
    let radiation = TabulatedRadiation::from_path(&path)?;
    tracing::info!(path = %path.display(), points = radiation.len(), "loaded radiative loss table");
    Ok(Box::new(radiation))
}

pub fn dem_bins(config: &LoopConfig) -> DemBins {
    let dem = config.dem_bins();
    DemBins {
        log_temperature_min: dem.log_temperature_min,
        log_temperature_max: dem.log_temperature_max,
        log_temperature_step: dem.log_temperature_step,
    }
}

pub fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
