use serde_json::Value;

/// Coarse structure of a plan value, used to pick a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    StringList,
    ObjectList,
    Object,
}

/// `null` counts as a scalar. A sequence without any mapping is a
/// `StringList` even when its elements are numbers; they render through
/// their string form.
pub fn classify(value: &Value) -> Shape {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Shape::Scalar,
        Value::Object(_) => Shape::Object,
        Value::Array(items) => {
            if items.iter().any(Value::is_object) {
                Shape::ObjectList
            } else {
                Shape::StringList
            }
        }
    }
}

/// True for values that would render nothing.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.iter().all(is_blank),
        Value::Object(map) => map.values().all(is_blank),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(classify(&json!("hi")), Shape::Scalar);
        assert_eq!(classify(&json!(3.5)), Shape::Scalar);
        assert_eq!(classify(&json!(true)), Shape::Scalar);
        assert_eq!(classify(&Value::Null), Shape::Scalar);
    }

    #[test]
    fn lists() {
        assert_eq!(classify(&json!(["a", "b"])), Shape::StringList);
        assert_eq!(classify(&json!([])), Shape::StringList);
        assert_eq!(classify(&json!([1, 2])), Shape::StringList);
        assert_eq!(classify(&json!([{"name": "A"}])), Shape::ObjectList);
        assert_eq!(classify(&json!(["a", {"name": "A"}])), Shape::ObjectList);
    }

    #[test]
    fn objects() {
        assert_eq!(classify(&json!({})), Shape::Object);
        assert_eq!(classify(&json!({"a": [1]})), Shape::Object);
    }

    #[test]
    fn classification_is_stable_across_nested_values() {
        let plan = json!({
            "themes": [{"name": "A", "color_palette": ["#fff"]}],
            "special_touches": ["Photo booth"],
            "reasoning": "because",
            "decorations": {"essential_items": ["Balloons"]}
        });

        let Value::Object(map) = &plan else {
            unreachable!()
        };
        for value in map.values() {
            let first = classify(value);
            let copy = value.clone();
            assert_eq!(classify(&copy), first);
        }
    }

    #[test]
    fn blank_values() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(is_blank(&json!([])));
        assert!(is_blank(&json!({"essential_items": [], "setup_tips": ""})));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!({"setup_tips": "Start early"})));
    }
}
