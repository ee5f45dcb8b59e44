use std::collections::BTreeMap;

use fete_core::save::{
    assemble_payload, check_selections, incomplete_prompt, SaveCheck, SaveError, SaveOutcome,
};
use fete_core::session::RenderSession;
use fete_protocol::store::{SavePayload, SelectedOption};

use crate::text::{targets, Target};

const STATUS_TTL_MS: u64 = 4_000;
const PAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub error: bool,
    pub expires_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Plan,
    Saved {
        event_id: String,
        tasks_saved: u32,
        budget_items_saved: u32,
        selected: BTreeMap<String, SelectedOption>,
    },
}

#[derive(Debug, Clone)]
pub struct Model {
    pub width: u16,
    pub height: u16,
    pub now_ms: u64,

    pub session: RenderSession,
    pub cursor: usize,
    pub screen: Screen,

    /// Sections still unpicked while the save prompt is open.
    pub confirm: Option<Vec<String>>,
    pub saving: bool,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Tab,
    MoveUp,
    MoveDown,
    GoTop,
    GoBottom,
    PageUp,
    PageDown,
    Enter,
    Backspace,
    Char(char),
    Cancel,
}

#[derive(Debug, Clone)]
pub enum Msg {
    Init,
    Resize { width: u16, height: u16 },
    Tick { now_ms: u64 },
    Action(Action),
    SaveFinished(Result<SaveOutcome, SaveError>),
}

#[derive(Debug, Clone)]
pub enum Effect {
    Quit,
    Save(Box<SavePayload>),
}

impl Model {
    pub fn new(session: RenderSession) -> Self {
        Self {
            width: 0,
            height: 0,
            now_ms: 0,
            session,
            cursor: 0,
            screen: Screen::Plan,
            confirm: None,
            saving: false,
            status: None,
        }
    }

    pub fn targets(&self) -> Vec<Target> {
        targets(self.session.view())
    }

    pub fn target(&self) -> Option<Target> {
        self.targets().get(self.cursor).copied()
    }

    pub fn confirm_prompt(&self) -> Option<String> {
        self.confirm.as_deref().map(incomplete_prompt)
    }

    fn set_status(&mut self, text: impl Into<String>, error: bool) {
        self.status = Some(Status {
            text: text.into(),
            error,
            expires_ms: self.now_ms + STATUS_TTL_MS,
        });
    }

    fn clamp_cursor(&mut self) {
        let len = self.targets().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    #[cfg(test)]
    fn validate(&self) {
        let len = self.targets().len();
        assert!(
            len == 0 || self.cursor < len,
            "cursor {} out of range ({len} targets)",
            self.cursor
        );
        if self.confirm.is_some() {
            assert!(!self.saving, "confirm prompt open while saving");
        }
    }
}

pub fn reduce(mut model: Model, msg: Msg) -> (Model, Vec<Effect>) {
    let mut effects = Vec::new();

    match msg {
        Msg::Init => {
            model.cursor = 0;
            if model.session.view().sections.is_empty() {
                model.set_status("plan has nothing to show", true);
            }
        }
        Msg::Resize { width, height } => {
            model.width = width;
            model.height = height;
        }
        Msg::Tick { now_ms } => {
            model.now_ms = now_ms;
            if model
                .status
                .as_ref()
                .is_some_and(|s| s.expires_ms <= now_ms)
            {
                model.status = None;
            }
        }
        Msg::Action(action) => {
            if action == Action::Quit {
                effects.push(Effect::Quit);
            } else if model.confirm.is_some() {
                reduce_confirm(&mut model, action, &mut effects);
            } else {
                match model.screen {
                    Screen::Plan => reduce_plan(&mut model, action, &mut effects),
                    Screen::Saved { .. } => reduce_saved(&mut model, action, &mut effects),
                }
            }
        }
        Msg::SaveFinished(result) => {
            model.saving = false;
            match result {
                Ok(SaveOutcome::Saved {
                    event_id,
                    tasks_saved,
                    budget_items_saved,
                }) => {
                    model.screen = Screen::Saved {
                        event_id,
                        tasks_saved,
                        budget_items_saved,
                        selected: model.session.selected_options(),
                    };
                    model.status = None;
                }
                Ok(SaveOutcome::Declined) => model.set_status("save cancelled", false),
                Err(err) => model.set_status(err.to_string(), true),
            }
        }
    }

    model.clamp_cursor();
    (model, effects)
}

fn reduce_plan(model: &mut Model, action: Action, effects: &mut Vec<Effect>) {
    let len = model.targets().len();
    match action {
        Action::Quit | Action::Cancel | Action::Char('q') => effects.push(Effect::Quit),
        Action::MoveUp | Action::Char('k') => model.cursor = model.cursor.saturating_sub(1),
        Action::MoveDown | Action::Char('j') => {
            if model.cursor + 1 < len {
                model.cursor += 1;
            }
        }
        Action::GoTop | Action::Char('g') => model.cursor = 0,
        Action::GoBottom | Action::Char('G') => model.cursor = len.saturating_sub(1),
        Action::PageUp => model.cursor = model.cursor.saturating_sub(PAGE),
        Action::PageDown => model.cursor = (model.cursor + PAGE).min(len.saturating_sub(1)),
        Action::Tab => {
            let all = model.targets();
            let next = all
                .iter()
                .enumerate()
                .skip(model.cursor + 1)
                .find(|(_, t)| matches!(t, Target::Header { .. }))
                .map(|(i, _)| i);
            model.cursor = next.unwrap_or(0);
        }
        Action::Enter | Action::Char(' ') => activate(model),
        Action::Backspace | Action::Char('x') => {
            if let Some(Target::Choice { section, index }) = model.target() {
                let key = section_key(model, section);
                if let Err(err) = model.session.unchoose(&key, index) {
                    model.set_status(err.to_string(), true);
                }
            }
        }
        Action::Char('s') => start_save(model, effects),
        Action::Char(_) => {}
    }
}

fn reduce_confirm(model: &mut Model, action: Action, effects: &mut Vec<Effect>) {
    match action {
        Action::Char('y') | Action::Char('Y') => {
            model.confirm = None;
            queue_save(model, effects);
        }
        Action::Char('n') | Action::Char('N') | Action::Cancel => {
            model.confirm = None;
            model.set_status("save cancelled", false);
        }
        _ => {}
    }
}

fn reduce_saved(model: &mut Model, action: Action, effects: &mut Vec<Effect>) {
    match action {
        Action::Char('b') | Action::Backspace => model.screen = Screen::Plan,
        Action::Cancel | Action::Enter | Action::Char('q') => effects.push(Effect::Quit),
        _ => {}
    }
}

fn activate(model: &mut Model) {
    match model.target() {
        Some(Target::Header { section }) => {
            let key = section_key(model, section);
            model.session.toggle(&key);
        }
        Some(Target::Choice { section, index }) => {
            let key = section_key(model, section);
            if let Err(err) = model.session.activate(&key, index) {
                model.set_status(err.to_string(), true);
            }
        }
        None => {}
    }
}

fn start_save(model: &mut Model, effects: &mut Vec<Effect>) {
    if model.saving {
        return;
    }
    match check_selections(&model.session) {
        Err(err) => model.set_status(err.to_string(), true),
        Ok(SaveCheck::Ready) => queue_save(model, effects),
        Ok(SaveCheck::Incomplete { missing }) => model.confirm = Some(missing),
    }
}

fn queue_save(model: &mut Model, effects: &mut Vec<Effect>) {
    model.saving = true;
    model.set_status("saving…", false);
    effects.push(Effect::Save(Box::new(assemble_payload(&model.session))));
}

fn section_key(model: &Model, section: usize) -> String {
    model
        .session
        .view()
        .sections
        .get(section)
        .map(|s| s.key.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fete_core::catalog::Catalog;
    use fete_core::response::parse_plan_payload;
    use fete_core::session::build_plan_ui;
    use serde_json::json;

    fn model() -> Model {
        let plan = parse_plan_payload(json!({
            "event_classification": "social_celebration",
            "plan": {
                "event_type": "social_celebration",
                "themes": [{"name": "Garden"}, {"name": "Disco"}],
                "activities": [{"name": "Trivia"}, {"name": "Karaoke"}],
                "budget_breakdown": [{"category": "Food", "amount": 100, "percentage": 100}]
            }
        }))
        .unwrap();
        let (model, _) = reduce(
            Model::new(build_plan_ui(plan, &Catalog::builtin())),
            Msg::Init,
        );
        model
    }

    fn step(model: Model, action: Action) -> (Model, Vec<Effect>) {
        let (model, effects) = reduce(model, Msg::Action(action));
        model.validate();
        (model, effects)
    }

    fn focus_header(mut model: Model, key: &str) -> Model {
        let idx = model
            .session
            .view()
            .sections
            .iter()
            .position(|s| s.key == key)
            .unwrap();
        model.cursor = model
            .targets()
            .iter()
            .position(|t| *t == Target::Header { section: idx })
            .unwrap();
        model
    }

    #[test]
    fn enter_on_header_expands_and_exposes_choices() {
        let m = focus_header(model(), "themes");
        let before = m.targets().len();
        let (m, effects) = step(m, Action::Enter);
        assert!(effects.is_empty());
        assert_eq!(m.targets().len(), before + 2);
        assert!(m.session.view().section("themes").unwrap().is_expanded());
    }

    #[test]
    fn enter_on_choice_selects_it() {
        let m = focus_header(model(), "themes");
        let (m, _) = step(m, Action::Enter);
        let (m, _) = step(m, Action::MoveDown);
        let (m, _) = step(m, Action::MoveDown);
        let (m, _) = step(m, Action::Enter);

        assert!(m.session.selections().is_selected("themes", 1));
        assert!(!m.session.selections().is_selected("themes", 0));
    }

    #[test]
    fn save_with_nothing_selected_reports_error_without_effect() {
        let (m, effects) = step(model(), Action::Char('s'));
        assert!(effects.is_empty());
        assert!(!m.saving);
        let status = m.status.unwrap();
        assert!(status.error);
        assert_eq!(status.text, "select at least one option");
    }

    #[test]
    fn incomplete_save_asks_and_decline_skips_store() {
        let mut m = model();
        m.session.choose("activities", 0).unwrap();

        let (m, effects) = step(m, Action::Char('s'));
        assert!(effects.is_empty());
        assert_eq!(m.confirm, Some(vec!["themes".to_owned()]));
        assert_eq!(
            m.confirm_prompt().unwrap(),
            "No selection for Themes. Save anyway?"
        );

        let (m, effects) = step(m, Action::Char('n'));
        assert!(effects.is_empty());
        assert!(m.confirm.is_none());
        assert!(!m.saving);
    }

    #[test]
    fn confirmed_save_emits_payload() {
        let mut m = model();
        m.session.choose("activities", 1).unwrap();

        let (m, _) = step(m, Action::Char('s'));
        let (m, effects) = step(m, Action::Char('y'));
        assert!(m.saving);
        let [Effect::Save(payload)] = effects.as_slice() else {
            panic!("expected one save effect, got {effects:?}");
        };
        assert!(payload.selected_options.contains_key("activities"));
        assert_eq!(payload.budget_breakdown.len(), 1);
    }

    #[test]
    fn complete_selection_saves_without_prompt() {
        let mut m = model();
        m.session.choose("themes", 0).unwrap();

        let (m, effects) = step(m, Action::Char('s'));
        assert!(m.confirm.is_none());
        assert!(matches!(effects.as_slice(), [Effect::Save(_)]));
    }

    #[test]
    fn successful_save_switches_to_saved_screen() {
        let mut m = model();
        m.session.choose("themes", 0).unwrap();
        let (m, _) = step(m, Action::Char('s'));

        let (m, _) = reduce(
            m,
            Msg::SaveFinished(Ok(SaveOutcome::Saved {
                event_id: "7".to_owned(),
                tasks_saved: 0,
                budget_items_saved: 1,
            })),
        );
        assert!(!m.saving);
        match &m.screen {
            Screen::Saved {
                event_id, selected, ..
            } => {
                assert_eq!(event_id, "7");
                assert!(selected.contains_key("themes"));
            }
            other => panic!("unexpected screen {other:?}"),
        }
    }

    #[test]
    fn failed_save_keeps_selections() {
        let mut m = model();
        m.session.choose("themes", 0).unwrap();
        let (m, _) = step(m, Action::Char('s'));

        let (m, _) = reduce(
            m,
            Msg::SaveFinished(Err(SaveError::Transport {
                message: "boom".to_owned(),
            })),
        );
        assert_eq!(m.screen, Screen::Plan);
        assert!(m.session.selections().is_selected("themes", 0));
        assert_eq!(m.status.unwrap().text, "save failed: boom");
    }

    #[test]
    fn collapsing_clamps_cursor() {
        let m = focus_header(model(), "themes");
        let (m, _) = step(m, Action::Enter);
        let (m, _) = step(m, Action::GoBottom);
        let last = m.cursor;
        let m = focus_header(m, "themes");
        let (m, _) = step(m, Action::Enter);
        assert!(m.targets().len() <= last);
        assert!(matches!(m.target(), Some(Target::Header { .. })));
    }

    #[test]
    fn status_expires_on_tick() {
        let (m, _) = step(model(), Action::Char('s'));
        assert!(m.status.is_some());
        let (m, _) = reduce(m, Msg::Tick { now_ms: STATUS_TTL_MS + 1 });
        assert!(m.status.is_none());
    }

    #[test]
    fn q_quits() {
        let (_, effects) = step(model(), Action::Char('q'));
        assert!(matches!(effects.as_slice(), [Effect::Quit]));
    }
}
