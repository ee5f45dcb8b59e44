use std::collections::BTreeMap;

use fete_protocol::store::SelectedOption;
use fete_protocol::PlanResponse;
use serde_json::Value;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::disclosure::Disclosure;
use crate::section::{render_section, Section};
use crate::selection::{Selected, SelectionMode, SelectionStore};
use crate::shape::is_blank;

const CLASSIFICATION_KEY: &str = "event_classification";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanView {
    pub sections: Vec<Section>,
}

impl PlanView {
    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.key == key)
    }

    fn section_mut(&mut self, key: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.key == key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no section named {key}")]
    UnknownSection { key: String },
    #[error("section {key} is not selectable")]
    NotSelectable { key: String },
    #[error("section {key} has no item #{position}")]
    OutOfRange { key: String, position: usize },
}

/// A rendered plan plus the user's interaction state: section disclosures
/// and the selection store.
#[derive(Debug, Clone)]
pub struct RenderSession {
    plan: PlanResponse,
    view: PlanView,
    selections: SelectionStore,
}

/// Entry point for hosts: renders `plan` into a fresh session.
pub fn build_plan_ui(plan: PlanResponse, catalog: &Catalog) -> RenderSession {
    RenderSession {
        view: render_plan(&plan, catalog),
        plan,
        selections: SelectionStore::new(),
    }
}

/// Renders every non-empty top-level key and every key of the `plan` body,
/// ordered by catalog rank. Values are rendered as received.
pub fn render_plan(plan: &PlanResponse, catalog: &Catalog) -> PlanView {
    let classification = Value::String(plan.event_classification.clone());
    let entries = std::iter::once((CLASSIFICATION_KEY, &classification))
        .chain(plan.extra.iter().map(|(k, v)| (k.as_str(), v)))
        .chain(plan.plan.sections.iter().map(|(k, v)| (k.as_str(), v)));

    let mut sections: Vec<Section> = entries
        .filter(|(_, value)| !is_blank(value))
        .map(|(key, value)| render_section(key, value, catalog))
        .collect();
    sections.sort_by_key(|s| s.rank);

    PlanView { sections }
}

impl RenderSession {
    /// Replaces the plan. Selections from the previous plan are dropped.
    pub fn load(&mut self, plan: PlanResponse, catalog: &Catalog) {
        self.selections.clear();
        self.view = render_plan(&plan, catalog);
        self.plan = plan;
    }

    pub fn plan(&self) -> &PlanResponse {
        &self.plan
    }

    pub fn view(&self) -> &PlanView {
        &self.view
    }

    pub fn selections(&self) -> &SelectionStore {
        &self.selections
    }

    pub fn toggle(&mut self, key: &str) -> Option<Disclosure> {
        let section = self.view.section_mut(key)?;
        let disclosure = section.disclosure.as_mut()?;
        disclosure.toggle();
        Some(*disclosure)
    }

    pub fn choose(&mut self, key: &str, index: usize) -> Result<(), SelectError> {
        let mode = self.check_choice(key, index)?;
        self.selections.select(key, index, mode);
        Ok(())
    }

    pub fn unchoose(&mut self, key: &str, index: usize) -> Result<(), SelectError> {
        let mode = self.check_choice(key, index)?;
        self.selections.deselect(key, index, mode);
        Ok(())
    }

    /// Radio semantics for single-select, flip for multi-select.
    pub fn activate(&mut self, key: &str, index: usize) -> Result<(), SelectError> {
        let mode = self.check_choice(key, index)?;
        if mode == SelectionMode::Multi && self.selections.is_selected(key, index) {
            self.selections.deselect(key, index, mode);
        } else {
            self.selections.select(key, index, mode);
        }
        Ok(())
    }

    /// Current selections with each index replaced by its plan item.
    pub fn selected_options(&self) -> BTreeMap<String, SelectedOption> {
        self.selections
            .snapshot()
            .into_iter()
            .filter_map(|(key, selected)| {
                let section = self.view.section(&key)?;
                let option = match selected {
                    Selected::One(i) => SelectedOption::One(section.item(i)?.clone()),
                    Selected::Many(indices) => SelectedOption::Many(
                        indices
                            .into_iter()
                            .filter_map(|i| section.item(i).cloned())
                            .collect(),
                    ),
                };
                Some((key, option))
            })
            .collect()
    }

    fn check_choice(&self, key: &str, index: usize) -> Result<SelectionMode, SelectError> {
        let Some(section) = self.view.section(key) else {
            return Err(SelectError::UnknownSection {
                key: key.to_owned(),
            });
        };
        let Some(mode) = section.selection else {
            return Err(SelectError::NotSelectable {
                key: key.to_owned(),
            });
        };
        if !section.choices().any(|c| c.index == index) {
            return Err(SelectError::OutOfRange {
                key: key.to_owned(),
                position: index + 1,
            });
        }
        Ok(mode)
    }
}
