//! Theme token flattening.
//!
//! `{"colors": {"primary": "#000"}, "space": {"gutter": {"sm": 4}}}` becomes
//! `--primary: #000` and `--gutter-sm: 4px`. The top-level key only groups
//! tokens and does not appear in variable names.

use std::collections::BTreeMap;

use serde_json::Value;

use super::ExtractError;

/// Flatten a theme object into CSS custom properties.
pub fn flatten(theme: &Value) -> Result<BTreeMap<String, String>, ExtractError> {
    let groups = theme
        .as_object()
        .ok_or_else(|| ExtractError::Theme("theme must be a JSON object".into()))?;

    let mut vars = BTreeMap::new();
    for (group, tokens) in groups {
        let tokens = tokens
            .as_object()
            .ok_or_else(|| ExtractError::Theme(format!("`{group}` must be an object")))?;
        for (name, value) in tokens {
            flatten_into(name, value, &mut vars)?;
        }
    }
    Ok(vars)
}

fn flatten_into(
    prefix: &str,
    value: &Value,
    vars: &mut BTreeMap<String, String>,
) -> Result<(), ExtractError> {
    match value {
        Value::String(s) => {
            vars.insert(format!("--{prefix}"), s.clone());
        }
        Value::Number(n) => {
            vars.insert(format!("--{prefix}"), format!("{n}px"));
        }
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{prefix}-{key}"), nested, vars)?;
            }
        }
        other => {
            return Err(ExtractError::Theme(format!(
                "token `{prefix}` has unsupported value {other}"
            )));
        }
    }
    Ok(())
}

/// Render variables as a `:root` block.
pub fn render(vars: &BTreeMap<String, String>) -> String {
    if vars.is_empty() {
        return String::new();
    }
    let body: String = vars
        .iter()
        .map(|(name, value)| format!("{name}:{value};"))
        .collect();
    format!(":root{{{body}}}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested() {
        let vars = flatten(&json!({
            "colors": { "primary": "#000", "text": { "muted": "#999" } },
            "space": { "gutter": 4 }
        }))
        .unwrap();

        assert_eq!(vars["--primary"], "#000");
        assert_eq!(vars["--text-muted"], "#999");
        assert_eq!(vars["--gutter"], "4px");
    }

    #[test]
    fn test_flatten_rejects_bad_shapes() {
        assert!(flatten(&json!([1, 2])).is_err());
        assert!(flatten(&json!({ "colors": "red" })).is_err());
        assert!(flatten(&json!({ "colors": { "a": [1] } })).is_err());
    }

    #[test]
    fn test_render() {
        let vars = flatten(&json!({ "colors": { "a": "red", "b": "blue" } })).unwrap();
        assert_eq!(render(&vars), ":root{--a:red;--b:blue;}\n");
        assert_eq!(render(&BTreeMap::new()), "");
    }
}
