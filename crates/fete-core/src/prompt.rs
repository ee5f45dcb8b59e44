use fete_protocol::EventDetails;

pub const USER_PROMPT: &str =
    "Create a comprehensive event plan appropriate for this type of event.";

pub const SYSTEM_PROMPT: &str = r#"You are an expert event planning assistant.

Return a single JSON object with ALL of the following fields. Never skip fields.

1. event_classification: one of "social_celebration", "professional_gathering", "intellectual_gathering"
2. key_considerations: list of 3-5 important factors you considered
3. plan: plan object for the event type, with "event_type" set to the classification and ALL of its fields
4. logistics: list of 3-5 logistical items (parking, setup time, cleanup)
5. contingency_notes: list of 2-3 backup plans (weather, no-shows, technical issues)
6. reasoning: one paragraph explaining your choices

Classifications:
- social_celebration: birthdays, baby showers, anniversaries, parties
- professional_gathering: meetups, networking events, workshops, seminars
- intellectual_gathering: book clubs, study groups, hobby clubs, discussion groups

social_celebration plan fields:
- themes: 2-3 options, each {name, description, color_palette: [hex colors], atmosphere}
- decorations: {essential_items, optional_items, diy_opportunities, setup_tips}
- menu_options: 2-3 options, each {style, items, dietary_accommodations, beverage_pairings}
- activities: 3-4 options, each {name, duration, materials_needed, instructions}
- timeline: list of {time, activity, responsible_party}
- budget_breakdown
- special_touches: list of unique ideas

professional_gathering plan fields:
- agenda: list of agenda items with times
- networking_approach, room_setup: text
- tech_needs, refreshments, materials: lists
- budget_breakdown

intellectual_gathering plan fields:
- discussion_format, seating_arrangement: text
- preparation_guidelines, refreshments, materials_needed: lists
- discussion_prompts: 3-5 prompts
- budget_breakdown

budget_breakdown is always a list of {category, amount, percentage, notes}.
Use empty lists only when nothing applies."#;

/// Event-specific block appended to the system prompt.
pub fn event_instructions(details: &EventDetails) -> String {
    let mut lines = vec![
        "Current event details:".to_owned(),
        format!("- Title: {}", details.title),
        format!("- Description: {}", details.description),
        format!("- Date: {}", details.event_date),
        format!("- Guest count: {}", details.guest_count),
        format!(
            "- Total budget: ${:.2} (${:.2} per person)",
            details.total_budget,
            details.budget_per_person()
        ),
        format!("- Venue: {}", details.venue_type),
    ];
    if let Some(setting) = details.event_setting.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("- Setting: {setting}"));
    }
    lines.push(String::new());
    lines.push(format!(
        "Scale all suggestions for {} guests and a ${:.2} budget.",
        details.guest_count, details.total_budget
    ));
    lines.join("\n")
}

pub fn system_prompt(details: &EventDetails) -> String {
    format!("{SYSTEM_PROMPT}\n\n{}", event_instructions(details))
}
