use serde_json::{Map, Value};

const MONEY_HINTS: &[&str] = &["price", "budget", "amount", "cost"];
/// Whole words of a key that mark a head count.
const COUNT_WORDS: &[&str] = &["capacity", "count", "guests", "attendees", "headcount"];
const SUMMARY_KEYS: &[&str] = &["name", "title", "id", "theme", "menu_option"];

/// `budget_breakdown` -> `Budget Breakdown`.
pub fn format_key(key: &str) -> String {
    key.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats a value for display, picking a number style from the key name.
pub fn format_value(key: &str, value: &Value) -> String {
    if value.is_null() {
        return "N/A".to_owned();
    }

    let key_lower = key.to_ascii_lowercase();
    let number = as_number(value);

    if MONEY_HINTS.iter().any(|hint| key_lower.contains(hint)) {
        if let Some(n) = number {
            return format_money(n);
        }
    } else if key_lower.contains("percent") {
        if let Some(n) = number {
            return format!("{n:.1}%");
        }
    } else if key_lower.contains("rating") {
        if let Some(n) = number {
            return format!("⭐ {n:.1}/5.0");
        }
    } else if key_lower
        .split(['_', '-', ' '])
        .any(|word| COUNT_WORDS.contains(&word))
    {
        if let Some(n) = number {
            return group_thousands(&format!("{}", n.trunc() as i64));
        }
    }

    display_value(value)
}

/// Plain display form: strings unquoted, lists comma-joined, objects summarized.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_owned(),
        Value::Bool(true) => "Yes".to_owned(),
        Value::Bool(false) => "No".to_owned(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => item_summary(map),
    }
}

/// One-line label for a mapping nested in a list.
pub fn item_summary(map: &Map<String, Value>) -> String {
    for key in SUMMARY_KEYS {
        if let Some(v) = map.get(*key) {
            if !crate::shape::is_blank(v) {
                return display_value(v);
            }
        }
    }

    match map.iter().next() {
        Some((key, v)) => format!("{}: {}", format_key(key), display_value(v)),
        None => "Item".to_owned(),
    }
}

/// `1234.5` -> `$1,234.50`.
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Reads a number from a JSON number or a numeric string such as `"$1,200"`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '%'))
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };

    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{sign}{out}")
}
