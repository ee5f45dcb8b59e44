use serde_json::Value;

use crate::card::render_card;
use crate::catalog::{Catalog, CardTypeConfig, RendererKind, SectionConfig, GENERIC_CARD};
use crate::disclosure::Disclosure;
use crate::format::{as_number, display_value, format_money, format_value};
use crate::node::{Choice, Control, Node};
use crate::selection::SelectionMode;
use crate::shape::{classify, Shape};

/// One rendered plan key.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub color: Option<String>,
    pub rank: i32,
    /// Concrete renderer; never `Auto`.
    pub renderer: RendererKind,
    pub selection: Option<SelectionMode>,
    /// `None` for sections that are always shown.
    pub disclosure: Option<Disclosure>,
    pub body: Vec<Node>,
    pub shape: Shape,
    pub value: Value,
}

impl Section {
    pub fn is_expanded(&self) -> bool {
        self.disclosure.map_or(true, Disclosure::is_expanded)
    }

    pub fn choices(&self) -> impl Iterator<Item = &Choice> {
        Node::choices(&self.body)
    }

    /// The plan value behind choice `index`.
    pub fn item(&self, index: usize) -> Option<&Value> {
        match &self.value {
            Value::Array(items) => items.get(index),
            other if index == 0 => Some(other),
            _ => None,
        }
    }
}

pub fn render_section(key: &str, value: &Value, catalog: &Catalog) -> Section {
    let fallback;
    let config = match catalog.section(key) {
        Some(cfg) => cfg,
        None => {
            fallback = SectionConfig::fallback(key);
            &fallback
        }
    };

    let shape = classify(value);
    let renderer = resolve_renderer(config.renderer, shape);
    let selection = config.selection_mode().filter(|_| renderer.supports_selection());

    let body = match renderer {
        RendererKind::CardList => {
            let card_type = config
                .card_type
                .as_deref()
                .and_then(|name| catalog.card_type(name))
                .or_else(|| catalog.card_type(GENERIC_CARD))
                .cloned()
                .unwrap_or_else(CardTypeConfig::generic);
            render_cards(value, &card_type, selection, config)
        }
        RendererKind::SimpleList => render_lines(value, false, selection, config),
        RendererKind::NumberedList => render_lines(value, true, selection, config),
        RendererKind::Text => render_text(key, value),
        RendererKind::Timeline => render_timeline(value),
        RendererKind::Budget => render_budget(value),
        RendererKind::StructuredList => render_structured(value, config),
        RendererKind::Banner => vec![Node::Banner {
            text: crate::format::format_key(&display_value(value)),
        }],
        RendererKind::Checklist => vec![Node::Checklist {
            items: string_items(value),
        }],
        RendererKind::Auto => Vec::new(),
    };

    let title = match value {
        Value::Array(items) if renderer != RendererKind::Banner => {
            format!("{} ({})", config.title, items.len())
        }
        _ => config.title.clone(),
    };

    Section {
        key: key.to_owned(),
        title,
        color: config.color.clone().filter(|c| !c.trim().is_empty()),
        rank: config.rank,
        renderer,
        selection,
        disclosure: config
            .collapsible
            .then(|| Disclosure::initial(config.initially_open)),
        body,
        shape,
        value: value.clone(),
    }
}

fn resolve_renderer(kind: RendererKind, shape: Shape) -> RendererKind {
    if kind != RendererKind::Auto {
        return kind;
    }
    match shape {
        Shape::Scalar => RendererKind::Text,
        Shape::StringList => RendererKind::SimpleList,
        Shape::ObjectList | Shape::Object => RendererKind::CardList,
    }
}

fn render_cards(
    value: &Value,
    card_type: &CardTypeConfig,
    selection: Option<SelectionMode>,
    config: &SectionConfig,
) -> Vec<Node> {
    let items: Vec<(Option<usize>, &Value)> = match value {
        Value::Array(items) => items.iter().enumerate().map(|(i, v)| (Some(i), v)).collect(),
        other => vec![(None, other)],
    };

    items
        .into_iter()
        .map(|(index, item)| {
            let card = Node::Card(render_card(item, index, card_type));
            wrap_choice(card, index.unwrap_or(0), selection, config)
        })
        .collect()
}

fn render_lines(
    value: &Value,
    numbered: bool,
    selection: Option<SelectionMode>,
    config: &SectionConfig,
) -> Vec<Node> {
    let items = string_items(value);

    if selection.is_none() {
        return vec![if numbered {
            Node::NumberedList { items }
        } else {
            Node::BulletList {
                label: None,
                color: None,
                items,
            }
        }];
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let prefix = numbered.then(|| format!("{}.", i + 1));
            wrap_choice(Node::Inline { prefix, text }, i, selection, config)
        })
        .collect()
}

fn wrap_choice(
    node: Node,
    index: usize,
    selection: Option<SelectionMode>,
    config: &SectionConfig,
) -> Node {
    let Some(mode) = selection else {
        return node;
    };
    let control = match mode {
        SelectionMode::Single => Control::Radio,
        SelectionMode::Multi => Control::Checkbox,
    };
    Node::Choice(Choice {
        index,
        control,
        label: format!("{} #{}", config.effective_selection_label(), index + 1),
        content: Box::new(node),
    })
}

fn render_text(key: &str, value: &Value) -> Vec<Node> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| Node::Paragraph {
                text: format_value(key, item),
                italic: false,
            })
            .collect(),
        other => vec![Node::Paragraph {
            text: format_value(key, other),
            italic: false,
        }],
    }
}

fn render_timeline(value: &Value) -> Vec<Node> {
    object_items(value)
        .enumerate()
        .map(|(i, item)| Node::TimelineRow {
            time: text_field(item, "time"),
            activity: text_field(item, "activity"),
            responsible: Some(text_field(item, "responsible_party")).filter(|s| !s.is_empty()),
            shaded: i % 2 == 1,
        })
        .collect()
}

fn render_budget(value: &Value) -> Vec<Node> {
    let rows: Vec<(String, f64, f64, Option<String>)> = object_items(value)
        .map(|item| {
            let number = |key: &str| item.get(key).and_then(as_number).unwrap_or(0.0);
            (
                text_field(item, "category"),
                number("amount"),
                number("percentage"),
                Some(text_field(item, "notes")).filter(|s| !s.is_empty()),
            )
        })
        .collect();

    let total: f64 = rows.iter().map(|(_, amount, _, _)| amount).sum();

    let mut nodes = vec![Node::BudgetTotal {
        total,
        text: format!("Total Budget: {}", format_money(total)),
    }];
    nodes.extend(
        rows.into_iter()
            .map(|(category, amount, percentage, notes)| Node::BudgetRow {
                category,
                amount: format_money(amount),
                percentage,
                notes,
            }),
    );
    nodes
}

fn render_structured(value: &Value, config: &SectionConfig) -> Vec<Node> {
    let Value::Object(map) = value else {
        return render_text("", value);
    };

    config
        .subsections
        .iter()
        .filter_map(|sub| {
            let v = map.get(&sub.key)?;
            if crate::shape::is_blank(v) {
                return None;
            }
            Some(match v {
                Value::Array(_) => Node::BulletList {
                    label: Some(sub.label.clone()),
                    color: sub.color.clone(),
                    items: string_items(v),
                },
                other => Node::Callout {
                    label: Some(sub.label.clone()),
                    text: display_value(other),
                },
            })
        })
        .collect()
}

fn object_items(value: &Value) -> impl Iterator<Item = &serde_json::Map<String, Value>> {
    let items: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        _ => &[],
    };
    items.iter().filter_map(Value::as_object)
}

fn text_field(item: &serde_json::Map<String, Value>, key: &str) -> String {
    match item.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(v) => display_value(v),
    }
}

fn string_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(display_value).collect(),
        Value::Null => Vec::new(),
        other => vec![display_value(other)],
    }
}
