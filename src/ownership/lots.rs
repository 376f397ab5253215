use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::parser::patterns;

pub const NO_SPECIFIC_LOT: &str = "no specific lot";

/// One lot identifier after range expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LotLabel {
    Number(u32),
    /// Anything that is neither a number nor a well-formed range, kept verbatim.
    Literal(String),
    /// The property itself is the unit of ownership.
    Unspecified,
}

impl fmt::Display for LotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LotLabel::Number(n) => write!(f, "{n}"),
            LotLabel::Literal(s) => f.write_str(s),
            LotLabel::Unspecified => f.write_str(NO_SPECIFIC_LOT),
        }
    }
}

impl From<String> for LotLabel {
    fn from(s: String) -> Self {
        if s == NO_SPECIFIC_LOT {
            LotLabel::Unspecified
        } else {
            numeric(&s).map_or(LotLabel::Literal(s), LotLabel::Number)
        }
    }
}

impl From<LotLabel> for String {
    fn from(lot: LotLabel) -> Self {
        lot.to_string()
    }
}

/// Numeric lots first, in numeric order; every other label sorts after them
/// and keeps its relative order under a stable sort.
pub fn compare_lots(a: &LotLabel, b: &LotLabel) -> Ordering {
    match (a, b) {
        (LotLabel::Number(x), LotLabel::Number(y)) => x.cmp(y),
        (LotLabel::Number(_), _) => Ordering::Less,
        (_, LotLabel::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Expand a lot cell (`144`, `145 à 147`, `101\n103 à 106\n111`) into individual lots.
/// A range that [`patterns::lot_range`] rejects is kept as one literal.
/// An absent, empty or `-` cell means the property has no specific lot.
pub fn expand_lots(text: Option<&str>) -> Vec<LotLabel> {
    let text = match text.map(str::trim) {
        None | Some("") | Some("-") => return vec![LotLabel::Unspecified],
        Some(t) => t,
    };

    let mut lots = Vec::new();
    for token in text.replace('\n', ",").split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if patterns::looks_like_range(token) {
            match patterns::lot_range(token) {
                Some((start, end)) => lots.extend((start..=end).map(LotLabel::Number)),
                None => lots.push(LotLabel::Literal(token.to_string())),
            }
        } else {
            lots.push(numeric(token).map_or_else(|| LotLabel::Literal(token.to_string()), LotLabel::Number));
        }
    }
    lots
}

fn numeric(token: &str) -> Option<u32> {
    if token.is_empty() || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
