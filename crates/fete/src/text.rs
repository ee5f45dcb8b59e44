//! Turns a rendered plan into styled terminal lines.
//!
//! The TUI draws these lines directly; `fete render` flattens them to text.

use std::collections::BTreeMap;

use fete_core::format::display_value;
use fete_core::node::{parse_hex_color, Card, Choice, Control, Node, Swatch, SwatchColor};
use fete_core::section::Section;
use fete_core::selection::SelectionStore;
use fete_core::session::PlanView;
use fete_protocol::store::{SelectedOption, StoredEvent};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const INDENT: &str = "  ";
const BAR_WIDTH: usize = 20;

/// Something the cursor can rest on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Header { section: usize },
    Choice { section: usize, index: usize },
}

impl Target {
    pub fn section(self) -> usize {
        match self {
            Target::Header { section } | Target::Choice { section, .. } => section,
        }
    }
}

/// Section headers, plus the choices of every expanded section.
pub fn targets(view: &PlanView) -> Vec<Target> {
    let mut out = Vec::new();
    for (section_idx, section) in view.sections.iter().enumerate() {
        if section.disclosure.is_some() {
            out.push(Target::Header {
                section: section_idx,
            });
        }
        if section.is_expanded() {
            out.extend(section.choices().map(|c| Target::Choice {
                section: section_idx,
                index: c.index,
            }));
        }
    }
    out
}

/// Lines for the whole plan and the line index of `focus`, if drawn.
pub fn plan_lines(
    view: &PlanView,
    selections: &SelectionStore,
    focus: Option<Target>,
    expand_all: bool,
) -> (Vec<Line<'static>>, Option<usize>) {
    let mut lines = Vec::new();
    let mut focus_line = None;

    for (section_idx, section) in view.sections.iter().enumerate() {
        let header_focused = focus == Some(Target::Header {
            section: section_idx,
        });
        if header_focused {
            focus_line = Some(lines.len());
        }
        lines.push(header_line(section, header_focused));

        if !(expand_all || section.is_expanded()) {
            continue;
        }

        let focused_choice = match focus {
            Some(Target::Choice { section, index }) if section == section_idx => Some(index),
            _ => None,
        };
        let mut ctx = Ctx {
            section_key: &section.key,
            selections,
            focused_choice,
            focus_line: None,
        };
        for node in &section.body {
            push_node(&mut lines, node, 1, &mut ctx);
        }
        if ctx.focus_line.is_some() {
            focus_line = ctx.focus_line;
        }
        lines.push(Line::default());
    }

    (lines, focus_line)
}

/// Flattens styled lines to plain text.
pub fn to_plain(lines: &[Line<'_>]) -> String {
    let mut out = String::new();
    for line in lines {
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}

pub fn saved_event_lines(
    event_id: &str,
    tasks_saved: u32,
    budget_items_saved: u32,
    selected: &BTreeMap<String, SelectedOption>,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("✓ Event {event_id} saved"),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "{INDENT}{tasks_saved} tasks, {budget_items_saved} budget items"
        )),
        Line::default(),
        Line::from(Span::styled(
            "Selected options",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    if selected.is_empty() {
        lines.push(Line::from(format!("{INDENT}(none)")));
    }
    for (key, option) in selected {
        let values: Vec<String> = match option {
            SelectedOption::One(v) => vec![display_value(v)],
            SelectedOption::Many(vs) => vs.iter().map(display_value).collect(),
        };
        lines.push(Line::from(vec![
            Span::styled(
                format!("{INDENT}{}: ", fete_core::format::format_key(key)),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(values.join(", ")),
        ]));
    }
    lines
}

pub fn stored_event_lines(event: &StoredEvent) -> Vec<Line<'static>> {
    let mut lines = saved_event_lines(
        &event.id,
        event.tasks.len() as u32,
        event.budget.len() as u32,
        &event.selected_options,
    );
    lines.insert(
        1,
        Line::from(Span::styled(
            format!("{INDENT}{} · {}", event.event_classification, event.created_at),
            Style::default().fg(Color::Gray),
        )),
    );

    if !event.tasks.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Tasks",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for task in &event.tasks {
            let mark = if task.completed { "[x]" } else { "[ ]" };
            let mut text = format!("{INDENT}{mark} {} {}", task.due, task.title);
            if let Some(who) = task.assigned_to.as_deref() {
                text.push_str(&format!(" ({who})"));
            }
            lines.push(Line::from(text));
        }
    }

    if !event.budget.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Budget",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for row in &event.budget {
            lines.push(Line::from(format!(
                "{INDENT}{}: {} planned, {} spent",
                row.category,
                fete_core::format::format_money(row.planned_amount),
                fete_core::format::format_money(row.actual_amount)
            )));
        }
    }
    lines
}

struct Ctx<'a> {
    section_key: &'a str,
    selections: &'a SelectionStore,
    focused_choice: Option<usize>,
    focus_line: Option<usize>,
}

fn header_line(section: &Section, focused: bool) -> Line<'static> {
    let mut style = Style::default().add_modifier(Modifier::BOLD);
    if let Some(color) = section.color.as_deref().and_then(hex_color) {
        style = style.fg(color);
    }
    if section.disclosure.is_some_and(|d| d.is_expanded()) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    if focused {
        style = style.add_modifier(Modifier::REVERSED);
    }

    let chevron = section.disclosure.map(|d| d.chevron()).unwrap_or("");
    Line::from(Span::styled(format!("{chevron}{}", section.title), style))
}

fn push_node(lines: &mut Vec<Line<'static>>, node: &Node, depth: usize, ctx: &mut Ctx<'_>) {
    let pad = INDENT.repeat(depth);
    match node {
        Node::Heading { text } => lines.push(Line::from(Span::styled(
            format!("{pad}{text}"),
            Style::default().add_modifier(Modifier::BOLD),
        ))),
        Node::Paragraph { text, italic } => {
            let style = if *italic {
                Style::default().add_modifier(Modifier::ITALIC)
            } else {
                Style::default()
            };
            for part in text.lines() {
                lines.push(Line::from(Span::styled(format!("{pad}{part}"), style)));
            }
        }
        Node::Inline { prefix, text } => {
            let text = match prefix.as_deref() {
                Some(prefix) => format!("{pad}{prefix} {text}"),
                None => format!("{pad}{text}"),
            };
            lines.push(Line::from(text));
        }
        Node::KeyValue { label, value } => lines.push(Line::from(vec![
            Span::styled(
                format!("{pad}{label}: "),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(value.clone()),
        ])),
        Node::BulletList {
            label,
            color,
            items,
        } => {
            if let Some(label) = label {
                let mut style = Style::default().add_modifier(Modifier::BOLD);
                if let Some(c) = color.as_deref().and_then(hex_color) {
                    style = style.fg(c);
                }
                lines.push(Line::from(Span::styled(format!("{pad}{label}"), style)));
            }
            for item in items {
                lines.push(Line::from(format!("{pad}{INDENT}• {item}")));
            }
        }
        Node::NumberedList { items } => {
            for (i, item) in items.iter().enumerate() {
                lines.push(Line::from(format!("{pad}{}. {item}", i + 1)));
            }
        }
        Node::Checklist { items } => {
            for item in items {
                lines.push(Line::from(vec![
                    Span::styled(format!("{pad}✓ "), Style::default().fg(Color::Green)),
                    Span::raw(item.clone()),
                ]));
            }
        }
        Node::Palette { label, swatches } => {
            let mut spans = vec![Span::styled(
                format!("{pad}{}", label.as_deref().unwrap_or("Colors:")),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            for swatch in swatches {
                spans.push(Span::raw(" "));
                spans.push(swatch_span(swatch));
                spans.push(Span::raw(format!(" {}", swatch.label)));
            }
            lines.push(Line::from(spans));
        }
        Node::Callout { label, text } => {
            if let Some(label) = label {
                lines.push(Line::from(Span::styled(
                    format!("{pad}{label}"),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            lines.push(Line::from(Span::styled(
                format!("{pad}{INDENT}{text}"),
                Style::default().fg(Color::Cyan),
            )));
        }
        Node::Banner { text } => lines.push(Line::from(Span::styled(
            format!("{pad}{text}"),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ))),
        Node::Card(card) => push_card(lines, card, depth, ctx),
        Node::Choice(choice) => push_choice(lines, choice, depth, ctx),
        Node::TimelineRow {
            time,
            activity,
            responsible,
            shaded,
        } => {
            let style = if *shaded {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let mut spans = vec![
                Span::styled(
                    format!("{pad}{time:<10}"),
                    style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {activity}"), style),
            ];
            if let Some(who) = responsible {
                spans.push(Span::styled(
                    format!("  👤 {who}"),
                    style.fg(Color::Gray),
                ));
            }
            lines.push(Line::from(spans));
        }
        Node::BudgetTotal { text, .. } => lines.push(Line::from(Span::styled(
            format!("{pad}{text}"),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))),
        Node::BudgetRow {
            category,
            amount,
            percentage,
            notes,
        } => {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{pad}{category}"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  {amount}")),
            ]));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{pad}{INDENT}{}", percentage_bar(*percentage)),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(format!(" {percentage:.1}%")),
            ]));
            if let Some(notes) = notes {
                lines.push(Line::from(Span::styled(
                    format!("{pad}{INDENT}💡 {notes}"),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }
}

fn push_card(lines: &mut Vec<Line<'static>>, card: &Card, depth: usize, ctx: &mut Ctx<'_>) {
    let mut body_depth = depth;
    if let Some(title) = card.title.as_deref() {
        lines.push(Line::from(Span::styled(
            format!("{}{title}", INDENT.repeat(depth)),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        body_depth += 1;
    }
    for node in &card.body {
        push_node(lines, node, body_depth, ctx);
    }
}

fn push_choice(lines: &mut Vec<Line<'static>>, choice: &Choice, depth: usize, ctx: &mut Ctx<'_>) {
    let selected = ctx.selections.is_selected(ctx.section_key, choice.index);
    let marker = match (choice.control, selected) {
        (Control::Radio, true) => "(•)",
        (Control::Radio, false) => "( )",
        (Control::Checkbox, true) => "[x]",
        (Control::Checkbox, false) => "[ ]",
    };

    let mut style = Style::default();
    if selected {
        style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
    }
    if ctx.focused_choice == Some(choice.index) {
        style = style.add_modifier(Modifier::REVERSED);
        ctx.focus_line = Some(lines.len());
    }

    lines.push(Line::from(Span::styled(
        format!("{}{marker} {}", INDENT.repeat(depth), choice.label),
        style,
    )));
    push_node(lines, &choice.content, depth + 1, ctx);
}

fn percentage_bar(percentage: f64) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn swatch_span(swatch: &Swatch) -> Span<'static> {
    let color = match &swatch.color {
        SwatchColor::Hex(hex) => hex_color(hex),
        SwatchColor::Named(name) => name.parse::<Color>().ok(),
    };
    match color {
        Some(c) => Span::styled("■", Style::default().fg(c)),
        None => Span::raw("□"),
    }
}

fn hex_color(raw: &str) -> Option<Color> {
    parse_hex_color(raw).map(|(r, g, b)| Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fete_core::catalog::Catalog;
    use fete_core::response::parse_plan_payload;
    use fete_core::session::build_plan_ui;
    use serde_json::json;

    fn session() -> fete_core::session::RenderSession {
        let plan = parse_plan_payload(json!({
            "event_classification": "social_celebration",
            "plan": {
                "event_type": "social_celebration",
                "themes": [{"name": "Garden", "color_palette": ["#ffc0cb"]}, {"name": "Disco"}],
                "budget_breakdown": [
                    {"category": "Food", "amount": 100, "percentage": 50},
                    {"category": "Decor", "amount": 60, "percentage": 30},
                    {"category": "Music", "amount": 40, "percentage": 20}
                ]
            }
        }))
        .unwrap();
        build_plan_ui(plan, &Catalog::builtin())
    }

    #[test]
    fn collapsed_sections_only_show_headers() {
        let s = session();
        let (lines, _) = plan_lines(s.view(), s.selections(), None, false);
        let text = to_plain(&lines);

        assert!(text.contains("▶ 🎨 Theme Options (2)"));
        assert!(!text.contains("Theme #1"));
        assert!(!text.contains("Total Budget"));
    }

    #[test]
    fn expanded_render_shows_budget_and_choices() {
        let mut s = session();
        s.choose("themes", 1).unwrap();
        let (lines, _) = plan_lines(s.view(), s.selections(), None, true);
        let text = to_plain(&lines);

        assert!(text.contains("( ) Theme #1"));
        assert!(text.contains("(•) Theme #2"));
        assert!(text.contains("#1: Garden"));
        assert!(text.contains("Total Budget: $200.00"));
        assert!(text.contains(" 50.0%"));
        assert!(text.contains(" 30.0%"));
        assert!(text.contains("Social Celebration"));
    }

    #[test]
    fn targets_follow_disclosure_state() {
        let mut s = session();
        let before = targets(s.view());
        assert!(before
            .iter()
            .all(|t| matches!(t, Target::Header { .. })));

        s.toggle("themes");
        let after = targets(s.view());
        let choices = after
            .iter()
            .filter(|t| matches!(t, Target::Choice { .. }))
            .count();
        assert_eq!(choices, 2);
    }

    #[test]
    fn focus_line_points_at_the_focused_choice() {
        let mut s = session();
        s.toggle("themes");
        let target = targets(s.view())
            .into_iter()
            .find(|t| matches!(t, Target::Choice { index: 1, .. }))
            .unwrap();

        let (lines, focus) = plan_lines(s.view(), s.selections(), Some(target), false);
        let line = to_plain(&lines[focus.unwrap()..=focus.unwrap()]);
        assert!(line.contains("Theme #2"));
    }

    #[test]
    fn percentage_bar_is_proportional() {
        assert_eq!(percentage_bar(50.0).chars().filter(|c| *c == '█').count(), 10);
        assert_eq!(percentage_bar(150.0).chars().filter(|c| *c == '█').count(), 20);
        assert_eq!(percentage_bar(-5.0).chars().filter(|c| *c == '░').count(), 20);
    }

    #[test]
    fn saved_view_lists_selected_options() {
        let selected = BTreeMap::from([
            ("themes".to_owned(), SelectedOption::One(json!({"name": "Disco"}))),
            (
                "activities".to_owned(),
                SelectedOption::Many(vec![json!({"name": "Trivia"}), json!({"name": "Karaoke"})]),
            ),
        ]);
        let text = to_plain(&saved_event_lines("3", 4, 2, &selected));

        assert!(text.contains("✓ Event 3 saved"));
        assert!(text.contains("4 tasks, 2 budget items"));
        assert!(text.contains("Themes: Disco"));
        assert!(text.contains("Activities: Trivia, Karaoke"));
    }
}
