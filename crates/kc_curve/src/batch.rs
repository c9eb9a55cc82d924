//! Independent per-field processing.
//!
//! Fields share nothing but the pipeline configuration, so a failure in one
//! is recorded and the rest still run.

use tracing::{info, warn};

use crate::{
    error::{KcError, Result},
    pipeline::Pipeline,
    types::{KcOutput, ObservationSet},
};

/// Observations for one named field
#[derive(Debug, Clone)]
pub struct FieldInput {
    pub name: String,
    pub observations: ObservationSet,
}

impl FieldInput {
    pub fn new(name: impl Into<String>, observations: ObservationSet) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }
}

#[derive(Debug)]
pub struct FieldOutcome {
    pub name: String,
    pub result: Result<KcOutput>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FieldOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &KcOutput)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|out| (o.name.as_str(), out)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &KcError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.name.as_str(), err)))
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Run every field through the pipeline, in order
pub fn process_batch<I>(pipeline: &Pipeline, fields: I) -> BatchReport
where
    I: IntoIterator<Item = FieldInput>,
{
    let outcomes: Vec<FieldOutcome> = fields
        .into_iter()
        .map(|field| {
            let result = pipeline.process(&field.observations);
            if let Err(err) = &result {
                warn!(field = %field.name, error = %err, "field failed");
            }
            FieldOutcome {
                name: field.name,
                result,
            }
        })
        .collect();

    let report = BatchReport { outcomes };
    info!(
        fields = report.outcomes.len(),
        failed = report.failed().count(),
        "batch finished"
    );
    report
}
