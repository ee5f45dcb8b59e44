use std::io::{self, Write as _};

use fete_core::save::{
    assemble_payload, check_selections, incomplete_prompt, SaveCheck, SaveError, SaveOutcome,
};
use fete_core::session::RenderSession;
use fete_protocol::store::SavePayload;

use crate::store::EventStore;

/// Asks the user whether to continue with an incomplete selection.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// `y`/`yes` on stdin, anything else declines.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        io::stderr().flush().ok();
        let mut input = String::new();
        if let Err(err) = io::stdin().read_line(&mut input) {
            tracing::warn!(error = %err, "read confirmation");
            return false;
        }
        let answer = input.trim().to_ascii_lowercase();
        answer == "y" || answer == "yes"
    }
}

pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Validates the session's selections, confirms gaps, and hands the payload
/// to `store`. Selections are left as they are whatever the result.
pub async fn save_selections(
    session: &RenderSession,
    store: &dyn EventStore,
    confirm: &mut dyn Confirm,
) -> Result<SaveOutcome, SaveError> {
    match check_selections(session)? {
        SaveCheck::Ready => {}
        SaveCheck::Incomplete { missing } => {
            if !confirm.confirm(&incomplete_prompt(&missing)) {
                tracing::info!(missing = ?missing, "save declined");
                return Ok(SaveOutcome::Declined);
            }
        }
    }

    submit(store, &assemble_payload(session)).await
}

pub async fn submit(store: &dyn EventStore, payload: &SavePayload) -> Result<SaveOutcome, SaveError> {
    match store.save(payload).await {
        Ok(receipt) if receipt.success => {
            let outcome = SaveOutcome::Saved {
                event_id: receipt.event_id.unwrap_or_default(),
                tasks_saved: receipt.tasks_saved.unwrap_or(0),
                budget_items_saved: receipt.budget_items_saved.unwrap_or(0),
            };
            tracing::info!(outcome = ?outcome, "selections saved");
            Ok(outcome)
        }
        Ok(receipt) => {
            let message = receipt
                .error
                .unwrap_or_else(|| "storage reported failure".to_owned());
            tracing::warn!(error = %message, "save rejected");
            Err(SaveError::Transport { message })
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "save failed");
            Err(SaveError::Transport {
                message: format!("{err:#}"),
            })
        }
    }
}
