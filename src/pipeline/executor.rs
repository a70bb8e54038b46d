//! Pipeline execution
//!
//! Runs an ordered list of resolved transform entries as a left fold over the
//! input text. Execution is all-or-nothing: the first failing step aborts the
//! run and no partial output escapes. Every attempt, successful or not,
//! leaves a full [`TraceEvent`] record behind.

use thiserror::Error;

use crate::domain::{preview, TraceEvent, TraceStatus, TransformEntry, TransformError};

/// Why a pipeline run produced no output.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("pipeline has no steps")]
    EmptyPipeline,

    #[error("step '{step}' (#{index}) is not runnable")]
    StepUnavailable { step: String, index: usize },

    #[error("step '{step}' (#{index}) failed: {message}")]
    StepFailed {
        step: String,
        index: usize,
        message: String,
    },

    #[error("step '{step}' (#{index}) timed out")]
    StepTimeout { step: String, index: usize },
}

/// A successful run.
#[derive(Debug)]
pub struct Completed {
    pub output: String,
    pub chars: usize,
    pub steps_run: usize,
}

/// Everything one run produced: the outcome plus its ordered trace.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Result<Completed, PipelineError>,
    pub trace: Vec<TraceEvent>,
}

impl RunReport {
    pub fn output(&self) -> Option<&str> {
        self.outcome.as_ref().ok().map(|c| c.output.as_str())
    }
}

/// Feeds `input` through `steps` in order. Each step sees the previous
/// step's full output; the trace records 80-character previews only.
pub fn run(steps: &[&TransformEntry], input: &str) -> RunReport {
    let mut trace = Vec::new();

    if steps.is_empty() {
        trace.push(TraceEvent::pipeline(
            TraceStatus::Error,
            PipelineError::EmptyPipeline.to_string(),
        ));
        return RunReport {
            outcome: Err(PipelineError::EmptyPipeline),
            trace,
        };
    }

    let mut current = input.to_string();
    for (index, entry) in steps.iter().enumerate() {
        trace.push(TraceEvent::step(
            index,
            &entry.name,
            TraceStatus::Started,
            entry.label.clone(),
        ));
        trace.push(TraceEvent::step(
            index,
            &entry.name,
            TraceStatus::Input,
            preview(&current),
        ));

        let Some(function) = entry.function.as_ref() else {
            let err = PipelineError::StepUnavailable {
                step: entry.name.clone(),
                index,
            };
            trace.push(TraceEvent::step(
                index,
                &entry.name,
                TraceStatus::Error,
                err.to_string(),
            ));
            return RunReport {
                outcome: Err(err),
                trace,
            };
        };

        match function.apply(&current) {
            Ok(output) => {
                trace.push(TraceEvent::step(
                    index,
                    &entry.name,
                    TraceStatus::Output,
                    preview(&output),
                ));
                current = output;
            }
            Err(cause) => {
                let err = match cause {
                    TransformError::Timeout(_) => PipelineError::StepTimeout {
                        step: entry.name.clone(),
                        index,
                    },
                    TransformError::Failed(message) => PipelineError::StepFailed {
                        step: entry.name.clone(),
                        index,
                        message,
                    },
                };
                trace.push(TraceEvent::step(
                    index,
                    &entry.name,
                    TraceStatus::Error,
                    err.to_string(),
                ));
                return RunReport {
                    outcome: Err(err),
                    trace,
                };
            }
        }
    }

    let chars = current.chars().count();
    trace.push(TraceEvent::pipeline(
        TraceStatus::Completed,
        format!("{} chars", chars),
    ));
    RunReport {
        outcome: Ok(Completed {
            output: current,
            chars,
            steps_run: steps.len(),
        }),
        trace,
    }
}
