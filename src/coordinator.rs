use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::AppError;
use crate::pipeline::{CycleOutcome, MarkerPipeline};

/// Process context: the pipeline, its schedule and the shutdown token.
pub struct Coordinator {
    pipeline: MarkerPipeline,
    interval: Duration,
    run_immediately: bool,
    cancel_token: CancellationToken,
}

impl Coordinator {
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Runs a single cycle outside the schedule.
    pub async fn run_once(&mut self) -> CycleOutcome {
        self.pipeline.run_cycle().await
    }

    /// Runs cycles on the schedule until the token is cancelled and returns
    /// how many cycles completed. A cycle in flight at cancellation is dropped.
    pub async fn run(mut self) -> u64 {
        let start = if self.run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = tokio::time::interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Marker crawler started, running every {} minutes",
            self.interval.as_secs() / 60
        );

        let mut cycles = 0;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    tracing::warn!("Shutdown requested, abandoning the running cycle");
                    break;
                }
                outcome = self.pipeline.run_cycle() => {
                    cycles += 1;
                    if !outcome.is_written() {
                        tracing::debug!("Cycle {} did not update the report", cycles);
                    }
                }
            }
        }

        tracing::info!("Marker crawler stopped after {} cycles", cycles);
        cycles
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    interval: Option<Duration>,
    pipeline: Option<MarkerPipeline>,
    cancel_token: Option<CancellationToken>,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            interval: None,
            pipeline: None,
            cancel_token: None,
        }
    }

    // Sets the cycle interval, this will override the configured minutes.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    // Controls whether the first cycle runs at startup or after one interval.
    pub fn run_immediately(mut self, run_immediately: bool) -> Self {
        self.settings.schedule.run_immediately = run_immediately;
        self
    }

    // Uses a prebuilt pipeline instead of one built from the settings.
    pub fn pipeline(mut self, pipeline: MarkerPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = Some(cancel_token);
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        self.settings.validate()?;
        let interval = self
            .interval
            .unwrap_or_else(|| self.settings.schedule.interval());
        if interval.is_zero() {
            return Err(AppError::Pipeline("Interval must be greater than 0".to_string()));
        }
        let pipeline = match self.pipeline {
            Some(pipeline) => pipeline,
            None => MarkerPipeline::from_settings(&self.settings),
        };

        Ok(Coordinator {
            pipeline,
            interval,
            run_immediately: self.settings.schedule.run_immediately,
            cancel_token: self.cancel_token.unwrap_or_default(),
        })
    }
}
