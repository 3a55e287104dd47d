use crate::domain::rsvp::{RsvpId, RsvpPatch};
use crate::repository::{RecordStore, RecordStoreError};
use crate::services::error_handling::LogHelper;
use std::fmt;
use tracing::instrument;

/// A logical operation applied to every id of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOperation {
    Delete,
    AssignGroup(String),
}

impl BulkOperation {
    pub fn steps(&self, ids: &[RsvpId]) -> Vec<BulkStep> {
        let action = match self {
            BulkOperation::Delete => StepAction::Delete,
            BulkOperation::AssignGroup(name) => StepAction::Update(RsvpPatch::group(name.clone())),
        };
        ids.iter()
            .map(|id| BulkStep {
                id: id.clone(),
                action: action.clone(),
            })
            .collect()
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulkOperation::Delete => f.write_str("delete"),
            BulkOperation::AssignGroup(name) => write!(f, "assign group '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepAction {
    Delete,
    Update(RsvpPatch),
}

/// One remote mutation of a bulk run.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkStep {
    pub id: RsvpId,
    pub action: StepAction,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub success_count: usize,
    pub error_count: usize,
    /// Ids whose remote call failed, in the order they were attempted.
    pub failed_ids: Vec<RsvpId>,
}

impl BulkOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.error_count == 0
    }
}

/// Runs `steps` one at a time: step i+1 is not issued until step i has
/// resolved. A failure is counted and the run continues. `reconcile` is
/// called once per confirmed step, before the next call is issued.
#[instrument(skip(store, steps, reconcile), fields(steps = steps.len()))]
pub async fn execute<F>(
    store: &dyn RecordStore,
    label: &str,
    steps: &[BulkStep],
    mut reconcile: F,
) -> BulkOutcome
where
    F: FnMut(&BulkStep) + Send,
{
    let mut outcome = BulkOutcome::default();

    for step in steps {
        let result: Result<(), RecordStoreError> = match &step.action {
            StepAction::Delete => store.delete(&step.id).await.map(|_| ()),
            StepAction::Update(patch) => store.update(&step.id, patch).await.map(|_| ()),
        };

        match result {
            Ok(()) => {
                LogHelper::log_record_operation(label, &step.id, true);
                reconcile(step);
                outcome.success_count += 1;
            }
            Err(error) => {
                tracing::warn!(rsvp_id = %step.id, operation = %label, error = %error, "Bulk step failed");
                LogHelper::log_record_operation(label, &step.id, false);
                outcome.error_count += 1;
                outcome.failed_ids.push(step.id.clone());
            }
        }
    }

    LogHelper::log_bulk_outcome(label, outcome.success_count, outcome.error_count);
    outcome
}
