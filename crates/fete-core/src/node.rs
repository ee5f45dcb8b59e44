//! Render tree produced by the section and card renderers.
//!
//! Nodes carry text and styling hints only; drawing them is up to the host.

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
        italic: bool,
    },
    /// Single line, optionally led by a prefix such as an emoji.
    Inline {
        prefix: Option<String>,
        text: String,
    },
    KeyValue {
        label: String,
        value: String,
    },
    BulletList {
        label: Option<String>,
        color: Option<String>,
        items: Vec<String>,
    },
    NumberedList {
        items: Vec<String>,
    },
    Checklist {
        items: Vec<String>,
    },
    Palette {
        label: Option<String>,
        swatches: Vec<Swatch>,
    },
    Callout {
        label: Option<String>,
        text: String,
    },
    Banner {
        text: String,
    },
    Card(Card),
    Choice(Choice),
    TimelineRow {
        time: String,
        activity: String,
        responsible: Option<String>,
        shaded: bool,
    },
    BudgetTotal {
        total: f64,
        text: String,
    },
    BudgetRow {
        category: String,
        amount: String,
        percentage: f64,
        notes: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: Option<String>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Radio,
    Checkbox,
}

/// A selectable item. `index` is the item's position in its section.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub index: usize,
    pub control: Control,
    pub label: String,
    pub content: Box<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swatch {
    pub color: SwatchColor,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwatchColor {
    Hex(String),
    Named(String),
}

impl Swatch {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let color = if raw.starts_with('#') {
            SwatchColor::Hex(raw.to_owned())
        } else {
            SwatchColor::Named(raw.to_ascii_lowercase())
        };
        Self {
            color,
            label: raw.to_owned(),
        }
    }
}

impl Node {
    pub fn choices(nodes: &[Node]) -> impl Iterator<Item = &Choice> {
        nodes.iter().filter_map(|node| match node {
            Node::Choice(choice) => Some(choice),
            _ => None,
        })
    }
}

/// Parses `#rgb` or `#rrggbb`.
pub fn parse_hex_color(raw: &str) -> Option<(u8, u8, u8)> {
    let hex = raw.trim().strip_prefix('#')?;
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
            let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
            let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            let mut out = [0u8; 3];
            for (slot, c) in out.iter_mut().zip(hex.chars()) {
                let v = c.to_digit(16)? as u8;
                *slot = v * 16 + v;
            }
            Some((out[0], out[1], out[2]))
        }
        _ => None,
    }
}
