use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BudgetItem, PlanResponse, TimelineItem};

/// The value recorded for one selectable section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectedOption {
    Many(Vec<Value>),
    One(Value),
}

impl SelectedOption {
    pub fn len(&self) -> usize {
        match self {
            SelectedOption::Many(items) => items.len(),
            SelectedOption::One(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handed to the storage collaborator at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub selected_options: BTreeMap<String, SelectedOption>,
    #[serde(default)]
    pub timeline: Vec<TimelineItem>,
    #[serde(default)]
    pub budget_breakdown: Vec<BudgetItem>,
    pub full_plan: PlanResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreReceipt {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks_saved: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_items_saved: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    #[serde(default)]
    pub due: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub category: String,
    pub planned_amount: f64,
    #[serde(default)]
    pub actual_amount: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&TimelineItem> for TaskRecord {
    fn from(item: &TimelineItem) -> Self {
        Self {
            title: item.activity.clone(),
            due: item.time.clone(),
            assigned_to: item.responsible_party.clone(),
            completed: false,
        }
    }
}

impl From<&BudgetItem> for BudgetRecord {
    fn from(item: &BudgetItem) -> Self {
        Self {
            category: item.category.clone(),
            planned_amount: item.amount,
            actual_amount: 0.0,
            percentage: item.percentage,
            notes: item.notes.clone(),
        }
    }
}

/// One saved event as written by the local file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: String,
    pub created_at: String,
    #[serde(default)]
    pub event_classification: String,
    #[serde(default)]
    pub selected_options: BTreeMap<String, SelectedOption>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub budget: Vec<BudgetRecord>,
    pub full_plan: PlanResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selected_option_keeps_lists_and_single_items_apart() {
        let many: SelectedOption = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(many, SelectedOption::Many(vec![json!("a"), json!("b")]));
        assert_eq!(many.len(), 2);

        let one: SelectedOption = serde_json::from_value(json!({"name": "Garden"})).unwrap();
        assert_eq!(one, SelectedOption::One(json!({"name": "Garden"})));
        assert!(!one.is_empty());
    }

    #[test]
    fn receipt_uses_camel_case_and_defaults_missing_fields() {
        let receipt: StoreReceipt =
            serde_json::from_value(json!({"success": true, "eventId": "7", "tasksSaved": 3}))
                .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.event_id.as_deref(), Some("7"));
        assert_eq!(receipt.tasks_saved, Some(3));
        assert_eq!(receipt.budget_items_saved, None);
        assert_eq!(receipt.error, None);
    }

    #[test]
    fn receipt_unknown_fields_are_ignored() {
        let receipt: StoreReceipt =
            serde_json::from_value(json!({"success": false, "error": "boom", "trace": "x"}))
                .unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.error.as_deref(), Some("boom"));
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let plan: PlanResponse = serde_json::from_value(json!({
            "plan": {"event_type": "social_celebration"}
        }))
        .unwrap();
        let payload = SavePayload {
            selected_options: BTreeMap::from([(
                "themes".to_owned(),
                SelectedOption::One(json!({"name": "A"})),
            )]),
            timeline: vec![],
            budget_breakdown: vec![],
            full_plan: plan,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["selectedOptions"]["themes"]["name"], "A");
        assert!(value.get("budgetBreakdown").is_some());
        assert_eq!(value["fullPlan"]["plan"]["event_type"], "social_celebration");
    }

    #[test]
    fn timeline_items_become_open_tasks() {
        let item = TimelineItem {
            time: "6:00 PM".to_owned(),
            activity: "Guests arrive".to_owned(),
            responsible_party: Some("Host".to_owned()),
        };
        let task = TaskRecord::from(&item);
        assert_eq!(task.title, "Guests arrive");
        assert_eq!(task.due, "6:00 PM");
        assert_eq!(task.assigned_to.as_deref(), Some("Host"));
        assert!(!task.completed);
    }
}
