//! Run execution service: single loops and parallel batches.

use std::path::{Path, PathBuf};
use std::time::Instant;

use cl_physics::{BinnedDem, DemAccumulator};
use cl_project::LoopConfig;
use cl_results::{InitialSummary, RunManifest, compute_run_id, save_manifest, write_results};
use cl_sim::{LoopEngine, LoopModel, LoopResults, RunSummary};
use rayon::prelude::*;

use crate::assemble::{LoopSetup, assemble};
use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage, TransientProgress};
use crate::project_service;

/// Options for running loops.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub solver_version: String,
    /// Write the results file, manifest and DEM tables
    pub write_output: bool,
    /// Replaces the configured output path when set
    pub output_override: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            solver_version: env!("CARGO_PKG_VERSION").to_string(),
            write_output: true,
            output_override: None,
        }
    }
}

/// Request to execute a run from a configuration file.
pub struct RunRequest<'a> {
    pub config_path: &'a Path,
    pub options: RunOptions,
}

/// Wall-clock breakdown of a run.
#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub build_time_s: f64,
    pub solve_time_s: f64,
    pub save_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub output_path: PathBuf,
    pub results: LoopResults,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    transient: Option<TransientProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            transient,
        });
    }
}

/// Load a configuration file and run it.
pub fn run_loop(request: &RunRequest) -> AppResult<RunResponse> {
    run_loop_with_progress(request, None)
}

pub fn run_loop_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    emit_progress(
        &mut progress_cb,
        RunStage::LoadingConfig,
        started,
        Some(format!("Loading {}", request.config_path.display())),
        None,
    );
    let config = project_service::load_config(request.config_path)?;
    let base_dir = project_service::config_dir(request.config_path);
    run_config_with_progress(&config, &base_dir, &request.options, progress_cb)
}

/// Run an already loaded configuration.
pub fn run_config(
    config: &LoopConfig,
    base_dir: &Path,
    options: &RunOptions,
) -> AppResult<RunResponse> {
    run_config_with_progress(config, base_dir, options, None)
}

pub fn run_config_with_progress(
    config: &LoopConfig,
    base_dir: &Path,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(
        &mut progress_cb,
        RunStage::BuildingModel,
        started,
        Some("Building loop model".to_string()),
        None,
    );
    let build_started = Instant::now();
    let setup = assemble(config, base_dir)?;
    let output_path = options
        .output_override
        .clone()
        .unwrap_or_else(|| setup.output_path.clone());
    let expected_rows = setup.options.estimated_steps();
    let mut dem = match setup.dem_bins {
        Some(bins) => Some(BinnedDem::new(
            bins,
            setup.params.loop_length,
            setup.radiation.as_ref(),
            expected_rows,
        )?),
        None => None,
    };
    timing.build_time_s = build_started.elapsed().as_secs_f64();

    let solve_started = Instant::now();
    let (summary, results) = evolve(&setup, dem.as_mut(), started, &mut progress_cb)?;
    timing.solve_time_s = solve_started.elapsed().as_secs_f64();

    let run_id = compute_run_id(config, &options.solver_version);
    let manifest = RunManifest {
        run_id: run_id.clone(),
        name: config.name.clone(),
        timestamp: String::new(),
        solver: summary.solver.name().to_string(),
        solver_version: options.solver_version.clone(),
        rows: summary.rows,
        final_time: summary.final_time,
        adaptive_failures: summary.adaptive_failures,
        trim_count: summary.trim_count,
        initial: InitialSummary {
            temperature: summary.initial.temperature,
            density: summary.initial.density,
            iterations: summary.initial.iterations,
            converged: summary.initial.converged,
            relative_error: summary.initial.relative_error,
        },
        output_filename: output_path.display().to_string(),
    }
    .stamp();

    if options.write_output {
        emit_progress(
            &mut progress_cb,
            RunStage::SavingResults,
            started,
            Some(format!("Writing {}", output_path.display())),
            None,
        );
        let save_started = Instant::now();
        write_results(&output_path, &results)?;
        save_manifest(&output_path, &manifest)?;
        if let Some(dem) = &dem {
            dem.export(&output_path, summary.trim_count)?;
        }
        timing.save_time_s = save_started.elapsed().as_secs_f64();
    }

    timing.total_time_s = started.elapsed().as_secs_f64();
    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some(format!("{} rows in {:.2} s", summary.rows, timing.total_time_s)),
        None,
    );
    tracing::info!(
        run_id = %run_id,
        rows = summary.rows,
        output = %output_path.display(),
        "run complete"
    );

    Ok(RunResponse {
        run_id,
        manifest,
        output_path,
        results,
        timing,
    })
}

fn evolve(
    setup: &LoopSetup,
    dem: Option<&mut BinnedDem<'_>>,
    started: Instant,
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<(RunSummary, LoopResults)> {
    let model = LoopModel::new(setup.params, setup.radiation.as_ref(), &setup.heating)?;
    let mut engine = LoopEngine::new(model, setup.options.clone())?;
    if let Some(dem) = dem {
        engine = engine.with_dem(dem);
    }

    emit_progress(
        progress_cb,
        RunStage::SolvingInitialConditions,
        started,
        Some("Solving initial conditions".to_string()),
        None,
    );
    let ic = engine.initialize()?;

    emit_progress(
        progress_cb,
        RunStage::RunningTransient,
        started,
        Some(format!(
            "T0={:.3e} K, n0={:.3e} cm^-3 after {} iterations",
            ic.temperature, ic.density, ic.iterations
        )),
        None,
    );
    engine.evolve_with_progress(&mut |p| {
        emit_progress(
            progress_cb,
            RunStage::RunningTransient,
            started,
            None,
            Some(TransientProgress::from(&p)),
        )
    })?;
    let summary = engine.finalize()?;
    Ok((summary, engine.into_results()))
}

/// Run several configuration files in parallel. One result per input, in order.
pub fn run_batch(paths: &[PathBuf], options: &RunOptions) -> Vec<AppResult<RunResponse>> {
    tracing::info!(count = paths.len(), "starting batch");
    paths
        .par_iter()
        .map(|path| {
            run_loop(&RunRequest {
                config_path: path,
                options: options.clone(),
            })
        })
        .collect()
}
