//! Recursive-descent parser for the loose literal values that follow
//! `headers:`, `rows:`, `labels:` and `values:` in a model reply.
//!
//! Accepted grammar:
//!
//! ```text
//! value    := string | number | keyword | list | tuple | dict
//! list     := '[' (value (',' value)* ','?)? ']'
//! tuple    := '(' (value (',' value)* ','?)? ')'
//! dict     := '{' (value ':' value (',' value ':' value)* ','?)? '}'
//! string   := '"' ... '"' | '\'' ... '\''      (backslash escapes)
//! number   := [+-]? digits ('.' digits?)? exponent? | [+-]? '.' digits exponent?
//! keyword  := True | False | None | true | false | null
//! ```
//!
//! Bare words such as `[Name, Hours]` are rejected here; the callers fall back
//! to the pattern and token extractors for those.

use crate::models::Scalar;

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    List(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Booleans and nulls become text so they still fit a table cell.
    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Literal::Str(text) => Some(Scalar::Text(text)),
            Literal::Int(n) => Some(Scalar::Int(n)),
            Literal::Float(f) => Some(Scalar::Float(f)),
            Literal::Bool(b) => Some(Scalar::Text(b.to_string())),
            Literal::Null => Some(Scalar::Text(String::new())),
            Literal::List(_) | Literal::Map(_) => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Literal>> {
        match self {
            Literal::List(items) => Some(items),
            _ => None,
        }
    }

    /// A flat list of scalars, or nothing if any element is nested.
    pub fn into_scalars(self) -> Option<Vec<Scalar>> {
        self.into_list()?
            .into_iter()
            .map(Literal::into_scalar)
            .collect()
    }

    /// A list of rows. Elements that are not flat lists are skipped; an outer
    /// list with no usable rows yields `None`.
    pub fn into_rows(self) -> Option<Vec<Vec<Scalar>>> {
        let rows: Vec<Vec<Scalar>> = self
            .into_list()?
            .into_iter()
            .filter_map(Literal::into_scalars)
            .collect();

        (!rows.is_empty()).then_some(rows)
    }
}

/// Parses the whole input as one literal. Trailing text is an error.
pub fn parse_literal(input: &str) -> Option<Literal> {
    let mut parser = Parser { src: input, pos: 0 };
    parser.skip_ws();
    let value = parser.value(0)?;
    parser.skip_ws();

    if parser.pos == input.len() {
        Some(value)
    } else {
        None
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn take(&mut self, count: usize) -> Option<&'a str> {
        let start = self.pos;
        for _ in 0..count {
            self.bump()?;
        }
        Some(&self.src[start..self.pos])
    }

    fn value(&mut self, depth: usize) -> Option<Literal> {
        if depth > MAX_DEPTH {
            return None;
        }

        match self.peek()? {
            '[' => self.sequence('[', ']', depth).map(Literal::List),
            '(' => self.sequence('(', ')', depth).map(Literal::List),
            '{' => self.map(depth),
            '"' | '\'' => self.string().map(Literal::Str),
            c if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            c if c.is_alphabetic() || c == '_' => self.keyword(),
            _ => None,
        }
    }

    fn sequence(&mut self, open: char, close: char, depth: usize) -> Option<Vec<Literal>> {
        if !self.eat(open) {
            return None;
        }

        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Some(items);
            }

            items.push(self.value(depth + 1)?);
            self.skip_ws();

            if self.eat(',') {
                continue;
            }
            return self.eat(close).then_some(items);
        }
    }

    fn map(&mut self, depth: usize) -> Option<Literal> {
        if !self.eat('{') {
            return None;
        }

        let mut entries = Vec::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                return Some(Literal::Map(entries));
            }

            let key = self.value(depth + 1)?;
            self.skip_ws();
            if !self.eat(':') {
                return None;
            }
            self.skip_ws();
            let value = self.value(depth + 1)?;
            entries.push((key, value));
            self.skip_ws();

            if self.eat(',') {
                continue;
            }
            return self.eat('}').then_some(Literal::Map(entries));
        }
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();

        loop {
            match self.bump()? {
                c if c == quote => return Some(out),
                '\n' => return None,
                '\\' => match self.bump()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' => out.push('\\'),
                    '\'' => out.push('\''),
                    '"' => out.push('"'),
                    '\n' => {}
                    'u' => {
                        let hex = self.take(4)?;
                        let code = u32::from_str_radix(hex, 16).ok()?;
                        out.push(char::from_u32(code)?);
                    }
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                c => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Option<Literal> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }

        let mut digits = 0usize;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits += 1;
            } else if c == '.' && !is_float {
                is_float = true;
            } else {
                break;
            }
            self.bump();
        }

        if digits == 0 {
            return None;
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('-' | '+')) {
                self.bump();
            }
            let mut exponent_digits = 0usize;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
                exponent_digits += 1;
            }
            if exponent_digits == 0 {
                return None;
            }
            is_float = true;
        }

        let text = &self.src[start..self.pos];
        if is_float {
            return text.parse::<f64>().ok().map(Literal::Float);
        }

        text.parse::<i64>()
            .map(Literal::Int)
            .or_else(|_| text.parse::<f64>().map(Literal::Float))
            .ok()
    }

    fn keyword(&mut self) -> Option<Literal> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }

        match &self.src[start..self.pos] {
            "True" | "true" => Some(Literal::Bool(true)),
            "False" | "false" => Some(Literal::Bool(false)),
            "None" | "null" => Some(Literal::Null),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_rows_with_mixed_scalars() {
        let parsed = parse_literal(r#"[["Ali", 8], ['Sara', 7.5], ("Omar", -2)]"#)
            .expect("literal should parse");

        assert_eq!(
            parsed.into_rows(),
            Some(vec![
                vec![Scalar::Text("Ali".into()), Scalar::Int(8)],
                vec![Scalar::Text("Sara".into()), Scalar::Float(7.5)],
                vec![Scalar::Text("Omar".into()), Scalar::Int(-2)],
            ])
        );
    }

    #[test]
    fn rejects_bare_words_and_trailing_text() {
        assert_eq!(parse_literal("[Name, Hours]"), None);
        assert_eq!(parse_literal("[1, 2] and more"), None);
        assert_eq!(parse_literal("[1, 2"), None);
        assert_eq!(parse_literal("[1,, 2]"), None);
    }

    #[test]
    fn accepts_trailing_commas_and_whitespace() {
        let parsed = parse_literal("  [ 1 ,\n 2 , ]  ").expect("literal should parse");
        assert_eq!(
            parsed.into_scalars(),
            Some(vec![Scalar::Int(1), Scalar::Int(2)])
        );
    }

    #[test]
    fn string_escapes_and_embedded_commas() {
        let parsed =
            parse_literal(r#"["a,b", 'it\'s', "say \"hi\"", "A"]"#).expect("parse");
        assert_eq!(
            parsed.into_scalars(),
            Some(vec![
                Scalar::Text("a,b".into()),
                Scalar::Text("it's".into()),
                Scalar::Text("say \"hi\"".into()),
                Scalar::Text("A".into()),
            ])
        );
    }

    #[test]
    fn number_shapes() {
        assert_eq!(parse_literal("42"), Some(Literal::Int(42)));
        assert_eq!(parse_literal("+5"), Some(Literal::Int(5)));
        assert_eq!(parse_literal(".5"), Some(Literal::Float(0.5)));
        assert_eq!(parse_literal("5."), Some(Literal::Float(5.0)));
        assert_eq!(parse_literal("1e3"), Some(Literal::Float(1000.0)));
        assert_eq!(parse_literal("1.2.3"), None);
        assert_eq!(parse_literal("8am"), None);
    }

    #[test]
    fn keywords_and_maps() {
        let parsed = parse_literal(r#"{"ok": True, 'missing': None, "n": [1]}"#).expect("parse");
        assert_eq!(
            parsed,
            Literal::Map(vec![
                (Literal::Str("ok".into()), Literal::Bool(true)),
                (Literal::Str("missing".into()), Literal::Null),
                (Literal::Str("n".into()), Literal::List(vec![Literal::Int(1)])),
            ])
        );
    }

    #[test]
    fn flat_list_is_not_rows() {
        let parsed = parse_literal("[1, 2, 3]").expect("parse");
        assert_eq!(parsed.into_rows(), None);
    }

    #[test]
    fn depth_is_bounded() {
        let deep = format!("{}{}", "[".repeat(100), "]".repeat(100));
        assert_eq!(parse_literal(&deep), None);
    }

    #[test]
    fn unicode_text_survives() {
        let parsed = parse_literal(r#"["أحمد", "حاضر"]"#).expect("parse");
        assert_eq!(
            parsed.into_scalars(),
            Some(vec![
                Scalar::Text("أحمد".into()),
                Scalar::Text("حاضر".into())
            ])
        );
    }
}
