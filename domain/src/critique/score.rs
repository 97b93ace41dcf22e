//! Critic score extraction.
//!
//! Critics are told to state a score out of 10. The score is read from
//! free-form output and attached to the critic's message; it is
//! informational unless a [`CritiqueGate`](super::gate::CritiqueGate)
//! uses it.
//!
//! # Supported Formats
//!
//! 1. **JSON**: `{"score": 8, ...}` (also `"note"`, `"rating"`)
//! 2. **Fraction**: `8/10`, `Score: 7.5/10`, `note : 6 / 10` (last one wins)
//! 3. **Labelled number**: `Score: 9`, `Rating - 4`

/// Parse a critic's score, clamped to 0.0-10.0.
///
/// Returns `None` when the text carries no recognisable score.
///
/// # Examples
///
/// ```
/// use casegen_domain::critique::score::parse_critic_score;
///
/// assert_eq!(parse_critic_score(r#"{"score": 8, "critique": "Good"}"#), Some(8.0));
/// assert_eq!(parse_critic_score("Coverage is weak. Score: 6/10"), Some(6.0));
/// assert_eq!(parse_critic_score("Note: 7"), Some(7.0));
/// assert_eq!(parse_critic_score("Scenario 1 covers login"), None);
/// ```
pub fn parse_critic_score(response: &str) -> Option<f64> {
    // Try to find JSON in the response
    if let Some(start) = response.find('{')
        && let Some(end) = response[start..].rfind('}')
    {
        let json_str = &response[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(score) = ["score", "note", "rating"]
                .iter()
                .find_map(|k| parsed.get(*k).and_then(|v| v.as_f64()))
        {
            return Some(score.clamp(0.0, 10.0));
        }
    }

    if let Some(score) = last_fraction(response) {
        return Some(score.clamp(0.0, 10.0));
    }

    labelled_number(response).map(|s| s.clamp(0.0, 10.0))
}

fn parse_number(s: &str) -> Option<f64> {
    s.replace(',', ".").parse::<f64>().ok()
}

/// Last `N/10` (spaces around the slash allowed).
fn last_fraction(text: &str) -> Option<f64> {
    let mut found = None;
    for (slash, _) in text.match_indices('/') {
        let after = text[slash + 1..].trim_start();
        let Some(rest) = after.strip_prefix("10") else {
            continue;
        };
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            continue;
        }
        let before = text[..slash].trim_end();
        let start = before
            .char_indices()
            .rev()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == ','))
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        if let Some(n) = parse_number(before[start..].trim_matches(|c| c == '.' || c == ',')) {
            found = Some(n);
        }
    }
    found
}

/// First number following a score label (`score`, `note`, `rating`).
fn labelled_number(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    for label in ["score", "note", "rating"] {
        for (pos, _) in lower.match_indices(label) {
            let after = lower[pos + label.len()..]
                .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '='));
            let digits: String = after
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            if let Some(n) = parse_number(digits.trim_end_matches(['.', ','])) {
                return Some(n);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        assert_eq!(parse_critic_score(r#"{"score": 8, "reasoning": "ok"}"#), Some(8.0));
        let response = r#"
Here is my evaluation:
```json
{"note": 7, "critique": "Missing the lockout scenario"}
```
"#;
        assert_eq!(parse_critic_score(response), Some(7.0));
    }

    #[test]
    fn test_parse_fraction_takes_last() {
        assert_eq!(
            parse_critic_score("Previous draft was 5/10. This one: 8/10"),
            Some(8.0)
        );
        assert_eq!(parse_critic_score("Note : 6 / 10"), Some(6.0));
        assert_eq!(parse_critic_score("Score: 7.5/10"), Some(7.5));
        assert_eq!(parse_critic_score("Score: 7,5/10"), Some(7.5));
    }

    #[test]
    fn test_fraction_must_be_out_of_ten() {
        // 3/100 is not a score
        assert_eq!(parse_critic_score("covers 3/100 cases"), None);
    }

    #[test]
    fn test_labelled_number() {
        assert_eq!(parse_critic_score("Final score - 9"), Some(9.0));
        assert_eq!(parse_critic_score("RATING=4."), Some(4.0));
    }

    #[test]
    fn test_clamp() {
        assert_eq!(parse_critic_score(r#"{"score": 15}"#), Some(10.0));
        assert_eq!(parse_critic_score(r#"{"score": -5}"#), Some(0.0));
        assert_eq!(parse_critic_score("12/10, outstanding"), Some(10.0));
    }

    #[test]
    fn test_no_score() {
        assert_eq!(parse_critic_score(""), None);
        assert_eq!(parse_critic_score("Scenario 1: login. Scenario 2: logout."), None);
    }
}
