use clap::{Parser, Subcommand};
use cl_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunResponse, RunStage,
    project_service, run_service,
};
use cl_project::LoopConfig;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "coronal-loop")]
#[command(about = "Two-fluid coronal loop simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more loop configurations
    Run {
        /// Configuration files (YAML or JSON); several run in parallel
        #[arg(required = true)]
        configs: Vec<PathBuf>,
        /// Write results here instead of the configured output_filename (single run only)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Integrate without writing any files
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate configuration syntax and values
    Validate {
        /// Path to the configuration file
        config_path: PathBuf,
    },
    /// Show derived loop parameters and the initial equilibrium
    Show {
        /// Path to the configuration file
        config_path: PathBuf,
    },
    /// Write a quiescent loop configuration to start from
    Init {
        /// Destination (.yaml or .json)
        config_path: PathBuf,
        /// Loop half-length in Mm
        #[arg(long, default_value_t = 40.0)]
        length_megameters: f64,
        /// Background heating rate in erg cm^-3 s^-1
        #[arg(long, default_value_t = 0.01)]
        heating: f64,
        /// Results file the configuration points at
        #[arg(long, default_value = "results/loop.txt")]
        output_filename: String,
    },
}

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            configs,
            output,
            dry_run,
        } => cmd_run(&configs, output, dry_run),
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Show { config_path } => cmd_show(&config_path),
        Commands::Init {
            config_path,
            length_megameters,
            heating,
            output_filename,
        } => cmd_init(&config_path, length_megameters, heating, &output_filename),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    project_service::load_config(config_path)?;
    println!("✓ Configuration is valid");
    Ok(())
}

fn cmd_show(config_path: &Path) -> AppResult<()> {
    let config = project_service::load_config(config_path)?;
    let base_dir = project_service::config_dir(config_path);
    let d = project_service::describe(&config, &base_dir)?;

    if let Some(name) = &d.name {
        println!("Loop: {name}");
    }
    println!("  Half-length:      {:.3e} cm", d.loop_length_cm);
    println!("  Solver:           {}", d.solver);
    println!("  Radiation:        {}", d.radiation);
    println!("  Heating events:   {}", d.heating_events);
    println!("  Estimated rows:   {}", d.estimated_steps);
    println!(
        "  Abundance:        kB x {:.4}, m_i x {:.4}",
        d.boltzmann_correction, d.ion_mass_correction
    );
    println!("\nInitial equilibrium:");
    println!("  T0 = {:.4e} K", d.initial.temperature);
    println!("  n0 = {:.4e} cm^-3", d.initial.density);
    println!(
        "  {} iterations, relative error {:.2e}{}",
        d.initial.iterations,
        d.initial.relative_error,
        if d.initial.converged {
            ""
        } else {
            " (not converged)"
        }
    );
    Ok(())
}

fn cmd_init(
    config_path: &Path,
    length_megameters: f64,
    heating: f64,
    output: &str,
) -> AppResult<()> {
    if config_path.exists() {
        return Err(AppError::InvalidInput(format!(
            "{} already exists",
            config_path.display()
        )));
    }
    let config = LoopConfig::quiescent(length_megameters, heating, output);
    match config_path.extension().and_then(|e| e.to_str()) {
        Some("json") => cl_project::save_json(config_path, &config)?,
        _ => cl_project::save_yaml(config_path, &config)?,
    }
    println!("✓ Wrote {}", config_path.display());
    Ok(())
}

fn cmd_run(configs: &[PathBuf], output: Option<PathBuf>, dry_run: bool) -> AppResult<()> {
    let options = RunOptions {
        write_output: !dry_run,
        output_override: output,
        ..RunOptions::default()
    };

    if let [config_path] = configs {
        return cmd_run_single(config_path, options);
    }

    if options.output_override.is_some() {
        return Err(AppError::InvalidInput(
            "--output applies to a single configuration".to_string(),
        ));
    }

    println!("Running {} configurations", configs.len());
    let started = Instant::now();
    let outcomes = run_service::run_batch(configs, &options);
    let mut failures = 0usize;
    for (path, outcome) in configs.iter().zip(outcomes) {
        match outcome {
            Ok(response) => println!(
                "  ✓ {} -> {} ({} rows)",
                path.display(),
                response.output_path.display(),
                response.manifest.rows
            ),
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {e}", path.display());
            }
        }
    }
    println!("Batch finished in {:.2}s", started.elapsed().as_secs_f64());

    if failures > 0 {
        return Err(AppError::Simulation(format!(
            "{failures} of {} runs failed",
            configs.len()
        )));
    }
    Ok(())
}

fn cmd_run_single(config_path: &Path, options: RunOptions) -> AppResult<()> {
    println!("Running loop: {}", config_path.display());
    let request = RunRequest {
        config_path,
        options,
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let mut last_stage = None;
    let response = run_service::run_loop_with_progress(
        &request,
        Some(&mut |event| {
            let fraction = event
                .transient
                .as_ref()
                .map(|t| t.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = last_stage != Some(event.stage)
                || (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    println!("✓ Simulation completed: {}", response.run_id);
    print_run_summary(&response, request.options.write_output);
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(140));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.transient) {
        (RunStage::RunningTransient, Some(t)) => {
            let width = 28usize;
            let filled = ((t.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.1}/{:.1}s  step={}  tau={:.3e}s  failures={}  elapsed={:.1}s",
                bar,
                t.fraction_complete * 100.0,
                t.sim_time_s,
                t.t_end_s,
                t.step,
                t.tau_s,
                t.adaptive_failures,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {msg}"));
            }
            print!("{line}");
        }
    }
    let _ = io::stdout().flush();
}

fn print_run_summary(response: &RunResponse, wrote_output: bool) {
    let m = &response.manifest;
    println!("  Solver:        {}", m.solver);
    println!("  Rows:          {}", m.rows);
    println!("  Final time:    {:.3} s", m.final_time);
    if m.adaptive_failures > 0 {
        println!("  Adaptive step failures: {}", m.adaptive_failures);
    }
    println!(
        "  Initial state: T0={:.4e} K  n0={:.4e} cm^-3",
        m.initial.temperature, m.initial.density
    );
    if wrote_output {
        println!("  Output:        {}", response.output_path.display());
    }

    let timing = &response.timing;
    let total = timing.total_time_s.max(1.0e-12);
    println!("\nTiming summary:");
    println!(
        "  Build:   {:.3}s ({:.1}%)",
        timing.build_time_s,
        100.0 * timing.build_time_s / total
    );
    println!(
        "  Solve:   {:.3}s ({:.1}%)",
        timing.solve_time_s,
        100.0 * timing.solve_time_s / total
    );
    println!(
        "  Save:    {:.3}s ({:.1}%)",
        timing.save_time_s,
        100.0 * timing.save_time_s / total
    );
    println!("  Total:   {:.3}s", timing.total_time_s);
}
