use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use fete_core::format::format_key;

use super::core::{Model, Screen};
use crate::text::{plan_lines, saved_event_lines};

pub fn draw(frame: &mut Frame<'_>, model: &Model) {
    frame.render_widget(Clear, frame.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.size());

    draw_header(frame, model, chunks[0]);
    match &model.screen {
        Screen::Plan => draw_plan(frame, model, chunks[1]),
        Screen::Saved {
            event_id,
            tasks_saved,
            budget_items_saved,
            selected,
        } => {
            let block = Block::default()
                .title("Saved")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green));
            let lines = saved_event_lines(event_id, *tasks_saved, *budget_items_saved, selected);
            frame.render_widget(
                Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
                chunks[1],
            );
        }
    }
    draw_footer(frame, model, chunks[2]);

    if model.confirm.is_some() {
        draw_confirm_overlay(frame, model, chunks[1]);
    }
}

fn draw_header(frame: &mut Frame<'_>, model: &Model, area: Rect) {
    let plan = model.session.plan();
    let picked = model.session.selections().snapshot().len();

    let mut spans = vec![
        Span::styled("fete", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            format_key(&plan.event_classification),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw("  "),
        Span::styled(
            format!("picked: {picked}"),
            Style::default().fg(Color::Gray),
        ),
    ];
    if model.saving {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("saving", Style::default().fg(Color::Cyan)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_plan(frame: &mut Frame<'_>, model: &Model, area: Rect) {
    let (lines, focus_line) = plan_lines(
        model.session.view(),
        model.session.selections(),
        model.target(),
        false,
    );

    let block = Block::default()
        .title("Plan")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner_height = block.inner(area).height;
    let scroll = scroll_offset(focus_line.unwrap_or(0), inner_height);

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}

/// Keeps the focused line roughly centred once it would leave the viewport.
fn scroll_offset(focus_line: usize, viewport: u16) -> u16 {
    let half = usize::from(viewport / 2);
    focus_line.saturating_sub(half).min(u16::MAX as usize) as u16
}

fn draw_footer(frame: &mut Frame<'_>, model: &Model, area: Rect) {
    if let Some(status) = model.status.as_ref() {
        let label = if status.error {
            Span::styled("Error: ", Style::default().fg(Color::Red))
        } else {
            Span::styled("· ", Style::default().fg(Color::Gray))
        };
        let line = Line::from(vec![label, Span::raw(status.text.clone())]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let items: &[(&str, &str)] = match model.screen {
        Screen::Plan => &[
            ("↑/↓", "move"),
            ("Enter", "open/pick"),
            ("x", "unpick"),
            ("Tab", "next section"),
            ("s", "save"),
            ("q", "quit"),
        ],
        Screen::Saved { .. } => &[("b", "back"), ("q", "quit")],
    };

    let mut spans = Vec::new();
    for (idx, (key, desc)) in items.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            *key,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(": "));
        spans.push(Span::styled(*desc, Style::default().fg(Color::Gray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_confirm_overlay(frame: &mut Frame<'_>, model: &Model, area: Rect) {
    let Some(prompt) = model.confirm_prompt() else {
        return;
    };

    let overlay_height = area.height.min(5).max(area.height.min(3));
    let overlay_width = area.width.min(60).max(area.width.min(24));
    let overlay = Rect {
        x: area.x + area.width.saturating_sub(overlay_width) / 2,
        y: area.y + area.height.saturating_sub(overlay_height) / 2,
        width: overlay_width,
        height: overlay_height,
    };

    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .title("Save")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let lines = vec![
        Line::from(prompt),
        Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" save   "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" keep picking"),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}
