use serde_json::{Map, Value};

use crate::db;
use crate::forms::FormVariant;
use crate::state::SharedState;

use super::gate;
use super::mapper;
use super::outcome::{self, Outcome};

#[derive(Debug)]
pub enum PipelineError {
    /// The payload could not be mapped to a known form.
    Invalid(String),
    /// The form is switched off.
    Inactive(FormVariant),
}

/// Gate, map, write to the database, append to the spreadsheet, aggregate.
/// The writes run one after the other and neither is retried.
pub async fn run(state: &SharedState, raw: Map<String, Value>) -> Result<Outcome, PipelineError> {
    let mapped = mapper::map(&raw).map_err(PipelineError::Invalid)?;
    let record = mapped.record;

    if !gate::is_accepting(&state.pool, record.variant).await {
        tracing::info!("Rejected submission for inactive form {}", record.variant);
        return Err(PipelineError::Inactive(record.variant));
    }

    let primary = db::submissions::create(&state.pool, &record)
        .await
        .map(|s| s.with_folded_form_data())
        .map_err(|e| {
            tracing::error!("Failed to store {} submission: {e}", record.variant);
            e.to_string()
        });

    let secondary = state.sheets.append(&record, &raw).await;

    let outcome = outcome::aggregate(primary, secondary);
    match &outcome {
        Outcome::Accepted(a) => tracing::info!(
            "Accepted {} submission (database: {:?}, sheets: {:?})",
            record.variant,
            a.primary_status,
            a.sheets_status
        ),
        Outcome::Failed(e) => tracing::error!("Submission lost: {e}"),
    }

    Ok(outcome)
}
