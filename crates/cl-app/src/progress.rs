#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingConfig,
    BuildingModel,
    SolvingInitialConditions,
    RunningTransient,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::LoadingConfig => "Loading config",
            RunStage::BuildingModel => "Building model",
            RunStage::SolvingInitialConditions => "Solving initial conditions",
            RunStage::RunningTransient => "Running transient",
            RunStage::SavingResults => "Saving results",
            RunStage::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransientProgress {
    pub sim_time_s: f64,
    pub t_end_s: f64,
    pub fraction_complete: f64,
    pub step: usize,
    pub tau_s: f64,
    pub adaptive_failures: usize,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub transient: Option<TransientProgress>,
}

impl From<&cl_sim::SimProgress> for TransientProgress {
    fn from(p: &cl_sim::SimProgress) -> Self {
        Self {
            sim_time_s: p.sim_time,
            t_end_s: p.total_time,
            fraction_complete: p.fraction_complete,
            step: p.step,
            tau_s: p.tau,
            adaptive_failures: p.adaptive_failures,
        }
    }
}
