use fete_protocol::store::SavePayload;
use fete_protocol::{BudgetItem, PlanResponse, TimelineItem};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::format::{as_number, display_value};

use crate::selection::SelectionMode;
use crate::session::{PlanView, RenderSession};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("select at least one option")]
    NoSelection,
    #[error("save failed: {message}")]
    Transport { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveCheck {
    Ready,
    /// Single-select sections still without a pick, in display order.
    Incomplete { missing: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved {
        event_id: String,
        tasks_saved: u32,
        budget_items_saved: u32,
    },
    /// The user chose not to save an incomplete selection.
    Declined,
}

/// Single-select sections present in the rendered plan.
pub fn required_sections(view: &PlanView) -> Vec<&str> {
    view.sections
        .iter()
        .filter(|s| s.selection == Some(SelectionMode::Single))
        .map(|s| s.key.as_str())
        .collect()
}

pub fn check_selections(session: &RenderSession) -> Result<SaveCheck, SaveError> {
    let selections = session.selections();
    if selections.is_empty() {
        return Err(SaveError::NoSelection);
    }

    let missing: Vec<String> = required_sections(session.view())
        .into_iter()
        .filter(|key| selections.get(key).is_none())
        .map(str::to_owned)
        .collect();

    if missing.is_empty() {
        Ok(SaveCheck::Ready)
    } else {
        Ok(SaveCheck::Incomplete { missing })
    }
}

pub fn assemble_payload(session: &RenderSession) -> SavePayload {
    let plan = session.plan();
    SavePayload {
        selected_options: session.selected_options(),
        timeline: timeline_items(plan),
        budget_breakdown: budget_items(plan),
        full_plan: plan.clone(),
    }
}

/// Rows of `plan.timeline`. Entries that are not objects are skipped.
pub fn timeline_items(plan: &PlanResponse) -> Vec<TimelineItem> {
    section_objects(plan, "timeline")
        .map(|item| TimelineItem {
            time: text(item.get("time")).unwrap_or_default(),
            activity: text(item.get("activity")).unwrap_or_default(),
            responsible_party: text(item.get("responsible_party")),
        })
        .collect()
}

/// Rows of `plan.budget_breakdown`; amounts like `"$1,200"` are read as numbers.
pub fn budget_items(plan: &PlanResponse) -> Vec<BudgetItem> {
    section_objects(plan, "budget_breakdown")
        .map(|item| {
            let number = |key: &str| item.get(key).and_then(as_number).unwrap_or(0.0);
            BudgetItem {
                category: text(item.get("category")).unwrap_or_default(),
                amount: number("amount"),
                percentage: number("percentage"),
                notes: text(item.get("notes")),
            }
        })
        .collect()
}

fn section_objects<'a>(
    plan: &'a PlanResponse,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    plan.plan
        .section(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(display_value(other)),
    }
}

/// Prompt shown before saving with sections left unpicked.
pub fn incomplete_prompt(missing: &[String]) -> String {
    let names: Vec<String> = missing
        .iter()
        .map(|key| crate::format::format_key(key))
        .collect();
    format!("No selection for {}. Save anyway?", names.join(", "))
}
