use std::time::{Duration, Instant};

use tracing::{info, info_span};

use super::error::Stage;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration: Duration,
}

/// Wall-clock durations of the characterisation stages, in execution order.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    stages: Vec<StageTiming>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage, duration: Duration) {
        self.stages.push(StageTiming { stage, duration });
    }

    /// Runs `step` inside a span named after `stage`, recording its duration
    /// whether or not it fails.
    pub fn time<T>(&mut self, stage: Stage, step: impl FnOnce() -> T) -> T {
        let timer = Timer::start(stage);
        let value = info_span!("stage", %stage).in_scope(step);
        let (stage, duration) = timer.stop();
        self.record(stage, duration);
        value
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Summed duration of every run of `stage`.
    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.stages
            .iter()
            .filter(|s| s.stage == stage)
            .map(|s| s.duration)
            .reduce(|a, b| a + b)
    }

    pub fn slowest(&self) -> Option<StageTiming> {
        self.stages.iter().copied().max_by_key(|s| s.duration)
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn log_summary(&self) {
        let total = self.total_duration().as_secs_f64();
        for timing in &self.stages {
            let share = if total > 0.0 {
                timing.duration.as_secs_f64() / total * 100.0
            } else {
                0.0
            };
            info!(
                stage = %timing.stage,
                ms = timing.duration.as_secs_f64() * 1000.0,
                "{share:.1}% of run"
            );
        }
        info!(ms = total * 1000.0, "Total");
    }
}

pub struct Timer {
    start: Instant,
    stage: Stage,
}

impl Timer {
    pub fn start(stage: Stage) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn stop(self) -> (Stage, Duration) {
        (self.stage, self.start.elapsed())
    }
}
