use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::SelectionMode;

pub const GENERIC_CARD: &str = "generic";
pub const WILDCARD_KEY: &str = "*";
pub const DEFAULT_RANK: i32 = 50;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RendererKind {
    #[serde(rename = "card-list", alias = "card_list")]
    CardList,
    #[serde(rename = "simple-list", alias = "simple_list")]
    SimpleList,
    #[serde(rename = "numbered-list", alias = "numbered_list")]
    NumberedList,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "timeline")]
    Timeline,
    #[serde(rename = "budget")]
    Budget,
    #[serde(rename = "structured-list", alias = "structured_list")]
    StructuredList,
    #[serde(rename = "banner")]
    Banner,
    #[serde(rename = "checklist")]
    Checklist,
    /// Picked from the value's shape at render time.
    #[serde(rename = "auto")]
    #[default]
    Auto,
}

impl RendererKind {
    pub fn supports_selection(self) -> bool {
        matches!(
            self,
            RendererKind::CardList | RendererKind::SimpleList | RendererKind::NumberedList
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(rename = "initially-open", alias = "initially_open", default)]
    pub initially_open: bool,

    #[serde(default = "default_true")]
    pub collapsible: bool,

    #[serde(default)]
    pub renderer: RendererKind,

    #[serde(
        rename = "card-type",
        alias = "card_type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub card_type: Option<String>,

    #[serde(default)]
    pub selectable: bool,

    #[serde(rename = "multi-select", alias = "multi_select", default)]
    pub multi_select: bool,

    #[serde(
        rename = "selection-label",
        alias = "selection_label",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selection_label: Option<String>,

    #[serde(default = "default_rank")]
    pub rank: i32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,

    #[serde(flatten, default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, toml::Value>,
}

fn default_true() -> bool {
    true
}

fn default_rank() -> i32 {
    DEFAULT_RANK
}

impl SectionConfig {
    pub fn new(rank: i32, title: &str, color: &str, renderer: RendererKind) -> Self {
        Self {
            title: title.to_owned(),
            color: Some(color.to_owned()),
            initially_open: false,
            collapsible: true,
            renderer,
            card_type: None,
            selectable: false,
            multi_select: false,
            selection_label: None,
            rank,
            subsections: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Config used for plan keys the catalog does not know.
    pub fn fallback(key: &str) -> Self {
        Self {
            color: None,
            ..Self::new(
                DEFAULT_RANK,
                &crate::format::format_key(key),
                "",
                RendererKind::Auto,
            )
        }
    }

    pub fn open(mut self) -> Self {
        self.initially_open = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.collapsible = false;
        self.initially_open = true;
        self
    }

    pub fn cards(mut self, card_type: &str) -> Self {
        self.card_type = Some(card_type.to_owned());
        self
    }

    pub fn selectable(mut self, label: &str) -> Self {
        self.selectable = true;
        self.selection_label = Some(label.to_owned());
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi_select = true;
        self
    }

    pub fn subsection(mut self, key: &str, label: &str, color: Option<&str>) -> Self {
        self.subsections.push(Subsection {
            key: key.to_owned(),
            label: label.to_owned(),
            color: color.map(str::to_owned),
        });
        self
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        match (self.selectable, self.multi_select) {
            (false, _) => None,
            (true, false) => Some(SelectionMode::Single),
            (true, true) => Some(SelectionMode::Multi),
        }
    }

    pub fn effective_selection_label(&self) -> &str {
        match self.selection_label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => "Option",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsection {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "inline")]
    Inline,
    #[serde(rename = "key-value", alias = "key_value")]
    KeyValue,
    #[serde(rename = "bullet-list", alias = "bullet_list")]
    BulletList,
    #[serde(rename = "color-palette", alias = "color_palette")]
    ColorPalette,
    #[serde(rename = "auto")]
    #[default]
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,

    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(rename = "skip-if-empty", alias = "skip_if_empty", default)]
    pub skip_if_empty: bool,

    #[serde(default)]
    pub italic: bool,
}

impl FieldDescriptor {
    pub fn new(key: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_owned(),
            kind,
            label: None,
            prefix: None,
            skip_if_empty: false,
            italic: false,
        }
    }

    fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_owned());
        self
    }

    fn skip_if_empty(mut self) -> Self {
        self.skip_if_empty = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardTypeConfig {
    #[serde(
        rename = "title-key",
        alias = "title_key",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub title_key: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl CardTypeConfig {
    pub fn generic() -> Self {
        Self {
            title_key: None,
            fields: vec![FieldDescriptor::new(WILDCARD_KEY, FieldKind::Auto)],
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("section {section} references unknown card type: {card_type}")]
    UnknownCardType { section: String, card_type: String },
    #[error("section {section} is selectable but its renderer cannot show choices")]
    NotSelectable { section: String },
    #[error("section {section} sets multi-select without selectable")]
    MultiSelectWithoutSelectable { section: String },
    #[error("section {section} has an empty title")]
    EmptyTitle { section: String },
}

/// Rendering rules for plan sections and the card types they use.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    sections: BTreeMap<String, SectionConfig>,
    card_types: BTreeMap<String, CardTypeConfig>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            sections: BTreeMap::new(),
            card_types: BTreeMap::from([(GENERIC_CARD.to_owned(), CardTypeConfig::generic())]),
        }
    }

    pub fn builtin() -> Self {
        use RendererKind::*;

        let sections = [
            (
                "event_classification",
                SectionConfig::new(0, "Event Type", "#455a64", Banner).fixed(),
            ),
            (
                "key_considerations",
                SectionConfig::new(1, "🎯 Key Considerations", "#2e7d32", Checklist).fixed(),
            ),
            (
                "themes",
                SectionConfig::new(2, "🎨 Theme Options", "#673ab7", CardList)
                    .cards("theme")
                    .selectable("Theme"),
            ),
            (
                "decorations",
                SectionConfig::new(3, "🎈 Decorations", "#e91e63", StructuredList)
                    .subsection("essential_items", "🔴 Essential Items:", Some("#d32f2f"))
                    .subsection("optional_items", "🔵 Optional Items:", Some("#1976d2"))
                    .subsection("diy_opportunities", "✂️ DIY Opportunities:", Some("#388e3c"))
                    .subsection("setup_tips", "💡 Setup Tips:", None),
            ),
            (
                "menu_options",
                SectionConfig::new(4, "🍽️ Menu Options", "#ff6f00", CardList)
                    .cards("menu")
                    .selectable("Menu"),
            ),
            (
                "activities",
                SectionConfig::new(5, "🎮 Activities", "#9c27b0", CardList)
                    .cards("activity")
                    .selectable("Activity")
                    .multi(),
            ),
            (
                "budget_breakdown",
                SectionConfig::new(6, "💰 Budget Breakdown", "#4caf50", Budget),
            ),
            (
                "timeline",
                SectionConfig::new(7, "⏰ Event Timeline", "#1976d2", Timeline),
            ),
            (
                "special_touches",
                SectionConfig::new(8, "✨ Special Touches", "#ffd700", SimpleList)
                    .selectable("Special Touch")
                    .multi(),
            ),
            (
                "agenda",
                SectionConfig::new(3, "📋 Agenda", "#1976d2", CardList)
                    .cards(GENERIC_CARD)
                    .open(),
            ),
            (
                "networking_approach",
                SectionConfig::new(4, "🤝 Networking", "#388e3c", Text),
            ),
            (
                "room_setup",
                SectionConfig::new(5, "🏢 Room Setup", "#ff9800", Text),
            ),
            (
                "tech_needs",
                SectionConfig::new(6, "💻 Tech Requirements", "#f44336", SimpleList),
            ),
            (
                "refreshments",
                SectionConfig::new(7, "☕ Refreshments", "#795548", SimpleList),
            ),
            (
                "materials",
                SectionConfig::new(8, "📄 Materials", "#607d8b", SimpleList),
            ),
            (
                "discussion_format",
                SectionConfig::new(3, "💬 Discussion Format", "#7b1fa2", Text).open(),
            ),
            (
                "preparation_guidelines",
                SectionConfig::new(4, "📚 Preparation", "#5e35b1", SimpleList),
            ),
            (
                "discussion_prompts",
                SectionConfig::new(5, "💡 Discussion Prompts", "#7b1fa2", NumberedList).open(),
            ),
            (
                "seating_arrangement",
                SectionConfig::new(6, "🪑 Seating", "#388e3c", Text),
            ),
            (
                "materials_needed",
                SectionConfig::new(7, "📖 Materials", "#e64a19", SimpleList),
            ),
            (
                "logistics",
                SectionConfig::new(98, "Logistics", "#3f51b5", SimpleList),
            ),
            (
                "contingency_notes",
                SectionConfig::new(99, "Contingency Plans", "#f44336", SimpleList),
            ),
            (
                "reasoning",
                SectionConfig::new(100, "💭 AI Reasoning", "#9c27b0", Text),
            ),
        ];

        let card_types = [
            (
                "theme",
                CardTypeConfig {
                    title_key: Some("name".to_owned()),
                    fields: vec![
                        FieldDescriptor::new("description", FieldKind::Text),
                        FieldDescriptor::new("color_palette", FieldKind::ColorPalette)
                            .label("Colors:"),
                        FieldDescriptor::new("atmosphere", FieldKind::KeyValue),
                        FieldDescriptor::new(WILDCARD_KEY, FieldKind::Auto),
                    ],
                },
            ),
            (
                "menu",
                CardTypeConfig {
                    title_key: Some("style".to_owned()),
                    fields: vec![
                        FieldDescriptor::new("items", FieldKind::BulletList).label("Menu Items:"),
                        FieldDescriptor::new("dietary_accommodations", FieldKind::BulletList)
                            .label("🌱 Dietary:")
                            .skip_if_empty(),
                        FieldDescriptor::new("beverage_pairings", FieldKind::BulletList)
                            .label("🥤 Beverages:"),
                        FieldDescriptor::new(WILDCARD_KEY, FieldKind::Auto),
                    ],
                },
            ),
            (
                "activity",
                CardTypeConfig {
                    title_key: Some("name".to_owned()),
                    fields: vec![
                        FieldDescriptor::new("duration", FieldKind::Inline).prefix("⏱️"),
                        FieldDescriptor::new("instructions", FieldKind::Text).italic(),
                        FieldDescriptor::new("materials_needed", FieldKind::BulletList)
                            .label("📦 Materials:")
                            .skip_if_empty(),
                        FieldDescriptor::new(WILDCARD_KEY, FieldKind::Auto),
                    ],
                },
            ),
            (GENERIC_CARD, CardTypeConfig::generic()),
        ];

        Self {
            sections: sections
                .into_iter()
                .map(|(key, cfg)| (key.to_owned(), cfg))
                .collect(),
            card_types: card_types
                .into_iter()
                .map(|(name, cfg)| (name.to_owned(), cfg))
                .collect(),
        }
    }

    /// Adds or replaces entries. Call `validate` afterwards.
    pub fn with_overrides(
        mut self,
        sections: &BTreeMap<String, SectionConfig>,
        card_types: &BTreeMap<String, CardTypeConfig>,
    ) -> Self {
        for (key, cfg) in sections {
            self.sections.insert(key.clone(), cfg.clone());
        }
        for (name, cfg) in card_types {
            self.card_types.insert(name.clone(), cfg.clone());
        }
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for (key, cfg) in &self.sections {
            if cfg.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle {
                    section: key.clone(),
                });
            }

            if let Some(card_type) = cfg.card_type.as_ref() {
                if !self.card_types.contains_key(card_type) {
                    return Err(CatalogError::UnknownCardType {
                        section: key.clone(),
                        card_type: card_type.clone(),
                    });
                }
            }

            if cfg.multi_select && !cfg.selectable {
                return Err(CatalogError::MultiSelectWithoutSelectable {
                    section: key.clone(),
                });
            }

            if cfg.selectable && !cfg.renderer.supports_selection() {
                return Err(CatalogError::NotSelectable {
                    section: key.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn section(&self, key: &str) -> Option<&SectionConfig> {
        self.sections.get(key)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &SectionConfig)> {
        self.sections.iter()
    }

    pub fn card_type(&self, name: &str) -> Option<&CardTypeConfig> {
        self.card_types.get(name)
    }

    pub fn rank(&self, key: &str) -> i32 {
        self.section(key).map(|cfg| cfg.rank).unwrap_or(DEFAULT_RANK)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        Catalog::builtin().validate().unwrap();
    }

    #[test]
    fn builtin_selection_modes() {
        let catalog = Catalog::builtin();
        let mode = |key: &str| catalog.section(key).unwrap().selection_mode();
        assert_eq!(mode("themes"), Some(SelectionMode::Single));
        assert_eq!(mode("menu_options"), Some(SelectionMode::Single));
        assert_eq!(mode("activities"), Some(SelectionMode::Multi));
        assert_eq!(mode("special_touches"), Some(SelectionMode::Multi));
        assert_eq!(mode("budget_breakdown"), None);
    }

    #[test]
    fn validate_rejects_unknown_card_type() {
        let sections = BTreeMap::from([(
            "venues".to_owned(),
            SectionConfig::new(9, "Venues", "#000000", RendererKind::CardList).cards("venue"),
        )]);
        let catalog = Catalog::builtin().with_overrides(&sections, &BTreeMap::new());

        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCardType { .. }));
    }

    #[test]
    fn validate_accepts_new_card_type_from_overrides() {
        let sections = BTreeMap::from([(
            "venues".to_owned(),
            SectionConfig::new(9, "Venues", "#000000", RendererKind::CardList)
                .cards("venue")
                .selectable("Venue"),
        )]);
        let card_types = BTreeMap::from([(
            "venue".to_owned(),
            CardTypeConfig {
                title_key: Some("name".to_owned()),
                fields: vec![FieldDescriptor::new("address", FieldKind::Text)],
            },
        )]);

        let catalog = Catalog::builtin().with_overrides(&sections, &card_types);
        catalog.validate().unwrap();
        assert_eq!(catalog.rank("venues"), 9);
    }

    #[test]
    fn validate_rejects_selection_on_text_renderer() {
        let sections = BTreeMap::from([(
            "reasoning".to_owned(),
            SectionConfig::new(100, "Why", "#000000", RendererKind::Text).selectable("Reason"),
        )]);
        let catalog = Catalog::builtin().with_overrides(&sections, &BTreeMap::new());

        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::NotSelectable { .. }));
    }

    #[test]
    fn validate_rejects_multi_without_selectable() {
        let mut cfg = SectionConfig::new(9, "Extras", "#000000", RendererKind::SimpleList);
        cfg.multi_select = true;
        let sections = BTreeMap::from([("extras".to_owned(), cfg)]);
        let catalog = Catalog::builtin().with_overrides(&sections, &BTreeMap::new());

        let err = catalog.validate().unwrap_err();
        assert!(matches!(
            err,
            CatalogError::MultiSelectWithoutSelectable { .. }
        ));
    }

    #[test]
    fn section_config_parses_from_toml() {
        let cfg: SectionConfig = toml::from_str(
            r##"
            title = "Venues"
            color = "#1976d2"
            renderer = "card_list"
            card-type = "generic"
            selectable = true
            selection_label = "Venue"
            "##,
        )
        .unwrap();

        assert_eq!(cfg.renderer, RendererKind::CardList);
        assert_eq!(cfg.card_type.as_deref(), Some("generic"));
        assert_eq!(cfg.rank, DEFAULT_RANK);
        assert!(cfg.collapsible);
        assert_eq!(cfg.selection_mode(), Some(SelectionMode::Single));
        assert_eq!(cfg.effective_selection_label(), "Venue");
    }

    #[test]
    fn unknown_keys_fall_back_to_auto() {
        let catalog = Catalog::builtin();
        assert!(catalog.section("venue_suggestions").is_none());
        assert_eq!(catalog.rank("venue_suggestions"), DEFAULT_RANK);

        let cfg = SectionConfig::fallback("venue_suggestions");
        assert_eq!(cfg.title, "Venue Suggestions");
        assert_eq!(cfg.renderer, RendererKind::Auto);
        assert_eq!(cfg.color, None);
    }
}
