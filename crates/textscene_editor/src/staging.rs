// SPDX-License-Identifier: MIT OR Apache-2.0
//! Staged save and reload of the open scene.
//!
//! The open scene is written to its temp copy, replaced by an empty scene
//! and loaded back from the copy. Each stage runs on its own `step()` so that
//! an outer frame loop can keep running in between:
//! - a few idle frames first
//! - `SaveTemp`, `CreateNew` and `LoadTemp` in order
//! - transient I/O failures retry the same stage a bounded number of times

use crate::project::StagingSettings;
use std::io::ErrorKind;
use thiserror::Error;

/// Failure of one stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StagingError {
    /// Worth retrying on a later step
    #[error("transient failure: {0}")]
    Transient(String),
    /// Retrying cannot help
    #[error("{0}")]
    Fatal(String),
}

impl StagingError {
    /// Classify an I/O failure
    pub fn from_io(context: &str, error: &std::io::Error) -> Self {
        let message = format!("{context}: {error}");
        match error.kind() {
            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::PermissionDenied => {
                Self::Transient(message)
            }
            _ => Self::Fatal(message),
        }
    }

    /// Check if a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The side that does the actual work of each stage
pub trait StagingHost {
    /// Write the open scene to its temp copy
    fn save_temp(&mut self) -> Result<(), StagingError>;
    /// Replace the open scene with an empty one
    fn create_new(&mut self) -> Result<(), StagingError>;
    /// Load the temp copy as the open scene
    fn load_temp(&mut self) -> Result<(), StagingError>;
}

/// Stage the machine is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Waiting out the initial frames
    Delay,
    /// Next step writes the temp copy
    SaveTemp,
    /// Next step clears the scene
    CreateNew,
    /// Next step loads the temp copy
    LoadTemp,
    /// Finished successfully
    Complete,
    /// Gave up
    Failed,
}

impl Stage {
    /// Check if no further step does anything
    pub fn is_finished(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Failed)
    }

    fn next(self) -> Self {
        match self {
            Stage::Delay => Stage::SaveTemp,
            Stage::SaveTemp => Stage::CreateNew,
            Stage::CreateNew => Stage::LoadTemp,
            Stage::LoadTemp | Stage::Complete => Stage::Complete,
            Stage::Failed => Stage::Failed,
        }
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// Call `step` again on a later frame
    Working,
    /// Every stage succeeded
    Complete,
    /// A stage failed for good
    Failed,
}

/// Save then reload state machine, polled once per frame
#[derive(Debug, Clone)]
pub struct SaveReload {
    stage: Stage,
    delay_remaining: u32,
    attempts: u32,
    max_retries: u32,
    error: Option<StagingError>,
}

impl SaveReload {
    /// Start a new staged save and reload
    pub fn new(settings: StagingSettings) -> Self {
        let stage = if settings.delay_frames == 0 {
            Stage::SaveTemp
        } else {
            Stage::Delay
        };
        Self {
            stage,
            delay_remaining: settings.delay_frames,
            attempts: 0,
            max_retries: settings.max_retries,
            error: None,
        }
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Error that stopped the machine
    pub fn error(&self) -> Option<&StagingError> {
        self.error.as_ref()
    }

    /// Completed fraction between 0 and 1
    pub fn progress(&self) -> f32 {
        match self.stage {
            Stage::Delay | Stage::Failed => 0.0,
            Stage::SaveTemp => 0.25,
            Stage::CreateNew => 0.5,
            Stage::LoadTemp => 0.75,
            Stage::Complete => 1.0,
        }
    }

    fn result(&self) -> StepResult {
        match self.stage {
            Stage::Complete => StepResult::Complete,
            Stage::Failed => StepResult::Failed,
            _ => StepResult::Working,
        }
    }

    /// Advance by one frame
    pub fn step(&mut self, host: &mut dyn StagingHost) -> StepResult {
        let outcome = match self.stage {
            Stage::Delay => {
                self.delay_remaining = self.delay_remaining.saturating_sub(1);
                if self.delay_remaining == 0 {
                    self.stage = Stage::SaveTemp;
                }
                return StepResult::Working;
            }
            Stage::SaveTemp => host.save_temp(),
            Stage::CreateNew => host.create_new(),
            Stage::LoadTemp => host.load_temp(),
            Stage::Complete | Stage::Failed => return self.result(),
        };

        match outcome {
            Ok(()) => {
                tracing::debug!("Staging {:?} done", self.stage);
                self.stage = self.stage.next();
                self.attempts = 0;
                if self.stage == Stage::Complete {
                    tracing::info!("Staged save and reload complete");
                }
            }
            Err(e) if e.is_transient() && self.attempts < self.max_retries => {
                self.attempts += 1;
                tracing::warn!(
                    "Staging {:?} failed ({}), retry {}/{}",
                    self.stage,
                    e,
                    self.attempts,
                    self.max_retries
                );
            }
            Err(e) => {
                tracing::error!("Staging {:?} failed: {}", self.stage, e);
                self.stage = Stage::Failed;
                self.error = Some(e);
            }
        }
        self.result()
    }

    /// Step until the machine finishes
    pub fn run(&mut self, host: &mut dyn StagingHost) -> StepResult {
        loop {
            let result = self.step(host);
            if result != StepResult::Working {
                return result;
            }
        }
    }
}
