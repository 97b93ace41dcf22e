//! Permissive literal parsing.
//!
//! Models often emit data in a loose literal notation: single-quoted
//! strings, `True`/`False`/`None`, trailing commas. [`parse_literal`]
//! rewrites that notation into JSON and parses it strictly.

use serde_json::Value;

/// Parse a loose literal into a JSON container.
///
/// Returns `None` unless the result is an object or an array.
pub fn parse_literal(text: &str) -> Option<Value> {
    let json = to_json(text.trim())?;
    match serde_json::from_str::<Value>(&json) {
        Ok(value @ (Value::Array(_) | Value::Object(_))) => Some(value),
        _ => None,
    }
}

/// Rewrite loose literal notation as JSON text.
fn to_json(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                copy_string(c, &mut chars, &mut out)?;
                out.push('"');
            }
            ']' | '}' => {
                drop_trailing_comma(&mut out);
                out.push(c);
            }
            '(' => out.push('['),
            ')' => {
                drop_trailing_comma(&mut out);
                out.push(']');
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(match word.as_str() {
                    "True" => "true",
                    "False" => "false",
                    "None" => "null",
                    other => other,
                });
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Copy a quoted string body up to the closing `quote`, re-escaping for
/// a double-quoted JSON string. `None` on an unterminated string.
fn copy_string(
    quote: char,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    out: &mut String,
) -> Option<()> {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                match escaped {
                    '\'' => out.push('\''),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            c if c == quote => return Some(()),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    None
}

fn drop_trailing_comma(out: &mut String) {
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_quotes_and_keywords() {
        let value = parse_literal("[{'Test_Id': 'TC-1', 'automated': True, 'owner': None}]");
        assert_eq!(
            value,
            Some(json!([{"Test_Id": "TC-1", "automated": true, "owner": null}]))
        );
    }

    #[test]
    fn test_trailing_commas() {
        assert_eq!(parse_literal("{'a': [1, 2,], }"), Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_quotes_inside_strings() {
        assert_eq!(
            parse_literal(r#"['He said "hi"', 'it\'s fine']"#),
            Some(json!(["He said \"hi\"", "it's fine"]))
        );
    }

    #[test]
    fn test_keywords_inside_strings_untouched() {
        assert_eq!(
            parse_literal("{'text': 'None of True'}"),
            Some(json!({"text": "None of True"}))
        );
    }

    #[test]
    fn test_tuple_becomes_array() {
        assert_eq!(parse_literal("('a', 'b')"), Some(json!(["a", "b"])));
    }

    #[test]
    fn test_rejects_scalars_and_garbage() {
        assert_eq!(parse_literal("42"), None);
        assert_eq!(parse_literal("'just a string'"), None);
        assert_eq!(parse_literal("Scenario: login"), None);
        assert_eq!(parse_literal("['unterminated"), None);
    }
}
