//! Single-record classification: one flow, or all flows concurrently with
//! per-flow error isolation.

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use aftercare_ai::{Assessment, Invoker, OracleError, build_prompt};
use aftercare_core::logbook::LoggedAssessment;
use aftercare_core::{FieldRegistry, Flow, FlowRegistry, PatientRecord, serialize_record};

use crate::table::UNAVAILABLE;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error("all {count} flows failed")]
    AllFlowsFailed {
        count: usize,
        errors: Vec<(String, OracleError)>,
    },
}

/// Successful flows in canonical order, plus the error manifest for the
/// rest. At least one success is guaranteed; the all-failed case is
/// [`ClassifyError::AllFlowsFailed`].
#[derive(Debug)]
pub struct AllFlowsOutcome {
    pub results: Vec<(String, Assessment)>,
    pub errors: Vec<(String, OracleError)>,
}

/// Classify one record against a single flow. The first unrecoverable
/// error surfaces directly to the caller.
pub async fn classify_one(
    record: &PatientRecord,
    fields: &FieldRegistry,
    flow: &Flow,
    invoker: &dyn Invoker,
) -> Result<Assessment, OracleError> {
    let text = serialize_record(record, fields);
    let prompt = build_prompt(&flow.criteria, &text);
    invoker.invoke(&prompt).await
}

/// Classify one record against every registered flow concurrently.
///
/// Flows fail independently; whatever succeeded is returned in canonical
/// flow order together with the per-flow error manifest. Only a batch
/// where every flow failed is an error.
pub async fn classify_all_flows(
    record: &PatientRecord,
    fields: &FieldRegistry,
    flows: &FlowRegistry,
    invoker: Arc<dyn Invoker>,
) -> Result<AllFlowsOutcome, ClassifyError> {
    let text = serialize_record(record, fields);
    info!(flows = flows.len(), "classifying record against all flows");

    let calls = flows.all().map(|flow| {
        let prompt = build_prompt(&flow.criteria, &text);
        let flow_id = flow.id.clone();
        let invoker = Arc::clone(&invoker);
        async move {
            let result = invoker.invoke(&prompt).await;
            (flow_id, result)
        }
    });

    let mut results = Vec::with_capacity(flows.len());
    let mut errors = Vec::new();
    for (flow_id, result) in join_all(calls).await {
        match result {
            Ok(assessment) => results.push((flow_id, assessment)),
            Err(error) => {
                warn!(flow = %flow_id, error = %error, "flow failed");
                errors.push((flow_id, error));
            }
        }
    }

    if results.is_empty() {
        return Err(ClassifyError::AllFlowsFailed {
            count: errors.len(),
            errors,
        });
    }
    Ok(AllFlowsOutcome { results, errors })
}

/// Project an all-flows outcome into durable-log form, one entry per
/// registered flow in canonical order, with the sentinel for failed flows.
pub fn to_logged(outcome: &AllFlowsOutcome, flows: &FlowRegistry) -> Vec<LoggedAssessment> {
    flows
        .all()
        .map(|flow| {
            match outcome
                .results
                .iter()
                .find(|(id, _)| id == &flow.id)
            {
                Some((_, assessment)) => LoggedAssessment {
                    flow_name: flow.name.clone(),
                    risk_level: assessment.tier.as_thai().to_string(),
                    reason: assessment.reason.clone(),
                    recommendation: assessment.recommendation.clone(),
                },
                None => LoggedAssessment {
                    flow_name: flow.name.clone(),
                    risk_level: UNAVAILABLE.to_string(),
                    reason: UNAVAILABLE.to_string(),
                    recommendation: UNAVAILABLE.to_string(),
                },
            }
        })
        .collect()
}
