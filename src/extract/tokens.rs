//! Last-resort comma splitter for list text the literal parser rejects, such
//! as `[Ali, 8, "Main St, Dubai"]`.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::Scalar;

/// Splits one bracketed list into scalars. Never fails; unparseable input
/// yields whatever tokens could be recovered.
pub fn split_tokens(input: &str) -> Vec<Scalar> {
    let inner = strip_one_bracket_level(input.trim());
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut items = Vec::new();
    let mut pending: Option<(char, String)> = None;

    for raw in inner.split(',') {
        let part = raw.trim();

        if let Some((quote, mut buffer)) = pending.take() {
            buffer.push(',');
            buffer.push_str(raw);
            if part.ends_with(quote) {
                items.push(Scalar::Text(trim_quotes(buffer.trim()).to_string()));
            } else {
                pending = Some((quote, buffer));
            }
            continue;
        }

        match opening_quote(part) {
            Some(quote) if part.chars().count() > 1 && part.ends_with(quote) => {
                items.push(Scalar::Text(trim_quotes(part).to_string()));
            }
            Some(quote) => pending = Some((quote, raw.trim_start().to_string())),
            None => items.push(coerce_token(part)),
        }
    }

    if let Some((_, buffer)) = pending {
        items.push(Scalar::Text(trim_quotes(buffer.trim()).to_string()));
    }

    items
}

/// Applies [`split_tokens`] to every single-line `[...]` group in `input`,
/// after removing the enclosing list brackets.
pub fn split_rows(input: &str) -> Vec<Vec<Scalar>> {
    let Some(pattern) = row_group_pattern() else {
        return Vec::new();
    };

    let inner = strip_outer_list(input.trim());
    pattern
        .find_iter(inner)
        .map(|group| split_tokens(group.as_str()))
        .filter(|row| !row.is_empty())
        .collect()
}

/// All ASCII digits → integer; digits around exactly one `.` → float;
/// anything else → de-quoted text.
pub fn coerce_token(token: &str) -> Scalar {
    let token = token.trim();

    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<i64>() {
            return Scalar::Int(n);
        }
    }

    let dots = token.bytes().filter(|b| *b == b'.').count();
    if dots == 1
        && token.len() > 1
        && token.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        if let Ok(f) = token.parse::<f64>() {
            return Scalar::Float(f);
        }
    }

    Scalar::Text(trim_quotes(token).to_string())
}

pub(crate) fn trim_quotes(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

fn opening_quote(part: &str) -> Option<char> {
    match part.chars().next() {
        Some(c @ ('"' | '\'')) => Some(c),
        _ => None,
    }
}

fn strip_one_bracket_level(value: &str) -> &str {
    let value = value.strip_prefix('[').unwrap_or(value);
    value.strip_suffix(']').unwrap_or(value)
}

/// Drops a leading `[` and, only when it is the bracket closing that one, the
/// final `]`. A list that never closes keeps its last row's bracket.
fn strip_outer_list(value: &str) -> &str {
    let Some(rest) = value.strip_prefix('[') else {
        return value;
    };

    let mut depth = 1usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return if idx + 1 == rest.len() { &rest[..idx] } else { value };
                }
            }
            _ => {}
        }
    }

    rest
}

fn row_group_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[[^\n]*?\]").ok()).as_ref()
}
