use serde_json::Value;

use super::Tier;

/// Tier 1 then tier 2: the whole text as a JSON array, else the span from the leftmost `[`
/// to the rightmost `]`. Returns `None` when neither yields an array.
pub fn recover_array(raw: &str) -> Option<(Tier, Vec<Value>)> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw.trim()) {
        return Some((Tier::StrictJson, items));
    }
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Array(items)) => Some((Tier::EmbeddedJson, items)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_text_array_is_strict() {
        let (tier, items) = recover_array("  [1, 2]\n").expect("array");
        assert_eq!(tier, Tier::StrictJson);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn array_inside_prose_is_embedded() {
        let raw = "Here you go:\n[{\"question\":\"q\",\"answer\":\"a\"}]\nHope that helps!";
        let (tier, items) = recover_array(raw).expect("array");
        assert_eq!(tier, Tier::EmbeddedJson);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn non_array_json_falls_through() {
        assert!(recover_array(r#"{"question":"q"}"#).is_none());
        assert!(recover_array("] backwards [").is_none());
        assert!(recover_array("[not json]").is_none());
        assert!(recover_array("no brackets at all").is_none());
    }
}
