//! Bounded-concurrency coordinator for batch classification.
//!
//! Every (row, flow) pair is an independent unit of work. All units are
//! submitted up front; a counting admission gate caps how many hold an
//! outbound call at once, and tokio's FIFO semaphore queue keeps the rest
//! waiting without starvation. Results fan back in keyed by
//! (row index, flow id), so completion order can never scramble column
//! attribution. One unit's failure never cancels its siblings: the job
//! completes only when every unit has a recorded outcome.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use aftercare_ai::{Assessment, Invoker, OracleError, build_prompt};
use aftercare_core::{FieldRegistry, FlowRegistry, serialize_record};

use crate::table::{Table, UNAVAILABLE};

/// Default cap on simultaneously in-flight oracle calls.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("all {0} classification units failed")]
    AllUnitsFailed(usize),
}

/// One failed (row, flow) unit, reported alongside the partial table.
#[derive(Debug)]
pub struct UnitFailure {
    pub row: usize,
    pub flow_id: String,
    pub error: OracleError,
}

/// The assembled table plus the manifest of failed units.
#[derive(Debug)]
pub struct BatchOutcome {
    pub table: Table,
    pub failures: Vec<UnitFailure>,
}

/// Classify every row of `table` against every registered flow, holding at
/// most `max_concurrent` oracle calls in flight, and assemble the results
/// into three new columns per flow in canonical flow order.
///
/// Fails only when every unit failed; otherwise failed units get the
/// [`UNAVAILABLE`] sentinel in their own column triple and everything else
/// is returned as-is.
pub async fn classify_batch(
    mut table: Table,
    fields: &FieldRegistry,
    flows: &FlowRegistry,
    invoker: Arc<dyn Invoker>,
    max_concurrent: usize,
) -> Result<BatchOutcome, BatchError> {
    let rows = table.row_count();
    let total = rows * flows.len();
    info!(
        rows,
        flows = flows.len(),
        max_concurrent,
        "starting batch classification"
    );

    let gate = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut units: JoinSet<(usize, String, Result<Assessment, OracleError>)> = JoinSet::new();

    for row in 0..rows {
        // One canonical serialisation per row, shared by all its flows.
        let record = table.record_for_row(row);
        let text = serialize_record(&record, fields);

        for flow in flows.all() {
            let prompt = build_prompt(&flow.criteria, &text);
            let flow_id = flow.id.clone();
            let invoker = Arc::clone(&invoker);
            let gate = Arc::clone(&gate);

            units.spawn(async move {
                // Held for the duration of the outbound call; released on
                // drop whether the call succeeds, fails, or is abandoned.
                let _permit = gate.acquire_owned().await.expect("admission gate closed");
                let result = invoker.invoke(&prompt).await;
                (row, flow_id, result)
            });
        }
    }

    // Fan-in: wait for every unit. Slots are write-once by construction;
    // a unit that never reports (panic, abort) is marked failed below.
    let mut outcomes: HashMap<(usize, String), Result<Assessment, OracleError>> =
        HashMap::with_capacity(total);
    while let Some(joined) = units.join_next().await {
        match joined {
            Ok((row, flow_id, result)) => {
                outcomes.insert((row, flow_id), result);
            }
            Err(e) => warn!(error = %e, "classification unit aborted"),
        }
    }

    table.append_result_columns(flows);

    let mut failures = Vec::new();
    let mut successes = 0usize;
    for row in 0..rows {
        for flow in flows.all() {
            match outcomes.remove(&(row, flow.id.clone())) {
                Some(Ok(assessment)) => {
                    successes += 1;
                    table.extend_row(
                        row,
                        [
                            assessment.tier.as_thai().to_string(),
                            assessment.reason,
                            assessment.recommendation,
                        ],
                    );
                }
                Some(Err(error)) => {
                    warn!(row, flow = %flow.id, error = %error, "unit failed");
                    failures.push(UnitFailure {
                        row,
                        flow_id: flow.id.clone(),
                        error,
                    });
                    table.extend_row(row, unavailable_triple());
                }
                None => {
                    failures.push(UnitFailure {
                        row,
                        flow_id: flow.id.clone(),
                        error: OracleError::Unavailable("unit never reported".into()),
                    });
                    table.extend_row(row, unavailable_triple());
                }
            }
        }
    }

    if successes == 0 && total > 0 {
        return Err(BatchError::AllUnitsFailed(total));
    }

    info!(successes, failures = failures.len(), "batch complete");
    Ok(BatchOutcome { table, failures })
}

fn unavailable_triple() -> [String; 3] {
    [
        UNAVAILABLE.to_string(),
        UNAVAILABLE.to_string(),
        UNAVAILABLE.to_string(),
    ]
}
