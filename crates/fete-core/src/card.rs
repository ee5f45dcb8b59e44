use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::catalog::{CardTypeConfig, FieldDescriptor, FieldKind, WILDCARD_KEY};
use crate::format::{display_value, format_key, format_value};
use crate::node::{Card, Node, Swatch};

/// Renders one plan item. `index` is set when the card is part of a list
/// and numbers the title.
pub fn render_card(item: &Value, index: Option<usize>, card_type: &CardTypeConfig) -> Card {
    let Value::Object(map) = item else {
        return Card {
            title: None,
            body: vec![Node::Paragraph {
                text: display_value(item),
                italic: false,
            }],
        };
    };

    let title = card_title(map, index, card_type);

    let mut consumed: BTreeSet<&str> = card_type
        .fields
        .iter()
        .map(|f| f.key.as_str())
        .filter(|k| *k != WILDCARD_KEY)
        .collect();
    if let Some(key) = card_type.title_key.as_deref() {
        consumed.insert(key);
    }

    let mut body = Vec::new();
    for field in &card_type.fields {
        if field.key == WILDCARD_KEY {
            for (key, value) in map {
                if consumed.contains(key.as_str()) || value.is_null() {
                    continue;
                }
                body.extend(render_field(key, value, field, FieldKind::Auto));
            }
            continue;
        }

        let Some(value) = map.get(&field.key).filter(|v| !v.is_null()) else {
            continue;
        };
        body.extend(render_field(&field.key, value, field, field.kind));
    }

    Card { title, body }
}

fn card_title(
    map: &Map<String, Value>,
    index: Option<usize>,
    card_type: &CardTypeConfig,
) -> Option<String> {
    let key = card_type.title_key.as_deref()?;
    let text = map.get(key).map(display_value)?;
    if text.trim().is_empty() {
        return None;
    }

    Some(match index {
        Some(i) => format!("#{}: {text}", i + 1),
        None => text,
    })
}

fn render_field(
    key: &str,
    value: &Value,
    field: &FieldDescriptor,
    kind: FieldKind,
) -> Option<Node> {
    if field.skip_if_empty && crate::shape::is_blank(value) {
        return None;
    }

    let node = match kind {
        FieldKind::Text => Node::Paragraph {
            text: format_value(key, value),
            italic: field.italic,
        },
        FieldKind::Inline => Node::Inline {
            prefix: field.prefix.clone(),
            text: format_value(key, value),
        },
        FieldKind::KeyValue => Node::KeyValue {
            label: field_label(key, field),
            value: format_value(key, value),
        },
        FieldKind::BulletList => Node::BulletList {
            label: Some(field.label.clone().unwrap_or_else(|| format!("{}:", format_key(key)))),
            color: None,
            items: list_items(value),
        },
        FieldKind::ColorPalette => Node::Palette {
            label: field.label.clone(),
            swatches: list_items(value)
                .iter()
                .map(|raw| Swatch::parse(raw))
                .collect(),
        },
        FieldKind::Auto => match value {
            Value::Array(_) => Node::BulletList {
                label: Some(format!("{}:", field_label(key, field))),
                color: None,
                items: list_items(value),
            },
            _ => Node::KeyValue {
                label: field_label(key, field),
                value: format_value(key, value),
            },
        },
    };

    Some(node)
}

fn field_label(key: &str, field: &FieldDescriptor) -> String {
    match field.label.as_deref() {
        Some(label) if key == field.key => label.trim_end_matches(':').to_owned(),
        _ => format_key(key),
    }
}

fn list_items(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(display_value)
            .collect(),
        Value::Null => Vec::new(),
        other => vec![display_value(other)],
    }
}
