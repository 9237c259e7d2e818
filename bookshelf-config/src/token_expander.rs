use {
    lazy_static::lazy_static,
    regex::Regex,
    serde_json::{Map, Value},
};

use crate::ConfigError;

const MAX_PASSES: usize = 8;

lazy_static! {
    static ref TOKEN: Regex =
        Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("token pattern is a valid regex");
}

/// Replaces every `${dotted.path}` token found in string values with the value
/// at that path in the same document.
///
/// Tokens may point at values that themselves contain tokens; expansion runs
/// until the document stops changing. A path that does not exist, or that
/// names an object, array or null, is an error, as is a chain of tokens that
/// never settles.
pub fn expand_tokens(root: &Value) -> Result<Value, ConfigError> {
    let mut current = root.clone();

    for _ in 0..MAX_PASSES {
        let next = expand_value(&current, &current)?;
        if next == current {
            return match first_token(&next) {
                Some(path) => Err(ConfigError::TokenCycle(path)),
                None => Ok(next),
            };
        }
        current = next;
    }

    Err(ConfigError::TokenCycle(
        first_token(&current).unwrap_or_default(),
    ))
}

fn expand_value(value: &Value, root: &Value) -> Result<Value, ConfigError> {
    match value {
        Value::String(s) => expand_str(s, root).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| expand_value(item, root))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key.clone(), expand_value(item, root)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn expand_str(s: &str, root: &Value) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;

    for caps in TOKEN.captures_iter(s) {
        let (Some(whole), Some(path)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let replacement = lookup(root, path.as_str())
            .ok_or_else(|| ConfigError::UnresolvedToken(path.as_str().to_string()))?;

        out.push_str(&s[last..whole.start()]);
        out.push_str(&replacement);
        last = whole.end();
    }

    out.push_str(&s[last..]);
    Ok(out)
}

fn lookup(root: &Value, path: &str) -> Option<String> {
    let value = path
        .split('.')
        .try_fold(root, |node, key| node.as_object()?.get(key))?;

    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => TOKEN.captures(s).map(|caps| caps[1].to_string()),
        Value::Array(items) => items.iter().find_map(first_token),
        Value::Object(map) => map.values().find_map(first_token),
        _ => None,
    }
}
