use serde::Deserialize;
use tracing::debug;

use crate::models::Card;

#[derive(Deserialize)]
#[serde(untagged)]
enum CardsPayload {
    Many(Vec<Card>),
    One(Card),
}

/// Collects the JSON-looking lines after `CARDS_DATA:` and decodes them as a
/// card array. A lone card object is accepted too.
pub fn extract_cards(section: &str) -> Option<Vec<Card>> {
    let json = collect_json_lines(section);
    if json.is_empty() {
        return None;
    }

    let cards = match serde_json::from_str::<CardsPayload>(&json) {
        Ok(CardsPayload::Many(cards)) => cards,
        Ok(CardsPayload::One(card)) => vec![card],
        Err(err) => {
            debug!(error = %err, "cards block is not valid JSON");
            return None;
        }
    };

    (!cards.is_empty()).then_some(cards)
}

fn collect_json_lines(section: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in section.lines() {
        let line = line.trim();
        if looks_like_json(line) {
            lines.push(line);
        } else if !lines.is_empty() {
            break;
        }
    }

    lines.join(" ")
}

fn looks_like_json(line: &str) -> bool {
    !line.is_empty()
        && (line.starts_with('[')
            || line.starts_with('{')
            || line.contains("\":")
            || line.ends_with(']')
            || line.ends_with('}'))
}
