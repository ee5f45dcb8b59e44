use fete_protocol::PlanResponse;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("response is not valid JSON: {message}")]
    InvalidJson { message: String },
    #[error("expected a plan object, got {found}")]
    UnexpectedShape { found: &'static str },
    #[error("expected a single plan, got a list of {len}")]
    ListLength { len: usize },
    #[error("plan does not match the expected structure: {message}")]
    Structure { message: String },
}

/// Accepts the plan object itself, a JSON string holding it, or a
/// one-element list wrapping either.
pub fn parse_plan_payload(value: Value) -> Result<PlanResponse, MalformedResponse> {
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(|err| {
            MalformedResponse::Structure {
                message: err.to_string(),
            }
        }),
        Value::String(text) => parse_plan_text(&text),
        Value::Array(mut items) => {
            if items.len() != 1 {
                return Err(MalformedResponse::ListLength { len: items.len() });
            }
            parse_plan_payload(items.remove(0))
        }
        Value::Null => Err(MalformedResponse::UnexpectedShape { found: "null" }),
        Value::Bool(_) => Err(MalformedResponse::UnexpectedShape { found: "a boolean" }),
        Value::Number(_) => Err(MalformedResponse::UnexpectedShape { found: "a number" }),
    }
}

/// Parses raw response text. A surrounding ```json fence is stripped.
pub fn parse_plan_text(text: &str) -> Result<PlanResponse, MalformedResponse> {
    let body = strip_code_fence(text);
    let value: Value =
        serde_json::from_str(body).map_err(|err| MalformedResponse::InvalidJson {
            message: err.to_string(),
        })?;
    parse_plan_payload(value)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
