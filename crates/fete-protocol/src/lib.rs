use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod store;

pub const EVENT_TYPE_SOCIAL: &str = "social_celebration";
pub const EVENT_TYPE_PROFESSIONAL: &str = "professional_gathering";
pub const EVENT_TYPE_INTELLECTUAL: &str = "intellectual_gathering";

/// Root object returned by the planning agent.
///
/// Only the routing fields are typed. Every other key, at the root and
/// inside `plan`, is kept exactly as received so the renderer sees the
/// agent's JSON and not a re-serialized struct with filled-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(
        default,
        deserialize_with = "text_or_empty",
        skip_serializing_if = "String::is_empty"
    )]
    pub event_classification: String,
    pub plan: PlanBody,

    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl PlanResponse {
    /// Root-level value for `key`, e.g. `key_considerations` or `reasoning`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "social_celebration")]
    SocialCelebration,
    #[serde(rename = "professional_gathering")]
    ProfessionalGathering,
    #[serde(rename = "intellectual_gathering")]
    IntellectualGathering,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::SocialCelebration => EVENT_TYPE_SOCIAL,
            EventType::ProfessionalGathering => EVENT_TYPE_PROFESSIONAL,
            EventType::IntellectualGathering => EVENT_TYPE_INTELLECTUAL,
        }
    }
}

/// The `plan` object. Section keys depend on the event type:
///
/// - social: `themes`, `decorations`, `menu_options`, `activities`,
///   `timeline`, `budget_breakdown`, `special_touches`
/// - professional: `agenda`, `networking_approach`, `room_setup`,
///   `tech_needs`, `refreshments`, `materials`, `budget_breakdown`
/// - intellectual: `discussion_format`, `preparation_guidelines`,
///   `discussion_prompts`, `seating_arrangement`, `refreshments`,
///   `materials_needed`, `budget_breakdown`
///
/// Values are not coerced; `"amount": "$1,200"` and `"amount": 1200` are
/// both kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBody {
    pub event_type: EventType,

    #[serde(flatten, default)]
    pub sections: Map<String, Value>,
}

impl PlanBody {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            sections: Map::new(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type.as_str()
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimelineItem {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_party: Option<String>,
}

/// One allocation line. Percentages are reported as given; they are not
/// required to sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BudgetItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Parameters sent to the planning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub event_date: String,
    pub guest_count: u32,
    pub total_budget: f64,
    #[serde(default = "default_venue_type")]
    pub venue_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_setting: Option<String>,
}

fn default_venue_type() -> String {
    "home".to_owned()
}

impl EventDetails {
    pub fn budget_per_person(&self) -> f64 {
        if self.guest_count == 0 {
            self.total_budget
        } else {
            self.total_budget / f64::from(self.guest_count)
        }
    }
}
