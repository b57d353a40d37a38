//! Pull street name, house number and block/lot markers out of free text.
//!
//! Informal settlements are addressed as "Mz. B Lt. 12" (manzana/lote)
//! rather than by house number; providers rarely parse these.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::normalize_block_label;

static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mz|mza|manzana)\b\.?\s*([a-z0-9]+)\b").expect("block pattern")
});

static LOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:lt|lte|lote)\b\.?\s*([a-z0-9]+)\b").expect("lot pattern")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bn(?:ro|[º°o])?\.?\s*|#\s*)?\b(\d+(?:\s*-\s*[a-z0-9]+|[a-z])?)\b").expect("number pattern")
});

/// Address fragments found in a free-text address
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragments {
    pub street: Option<String>,
    pub number: Option<String>,
    pub block: Option<String>,
    pub lot: Option<String>,
}

/// Split a free-text address into fragments.
///
/// Only the first comma-separated part is read for the street and number
/// (the rest is usually district and city). The house number is the last
/// number in that part, so street names with digits ("Av. 28 de Julio 1020")
/// keep them.
pub fn parse_fragments(text: &str) -> Fragments {
    let block = BLOCK_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| normalize_block_label(m.as_str()));
    let lot = LOT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| normalize_block_label(m.as_str()));

    let head = text.split(',').next().unwrap_or_default();
    let head = BLOCK_RE.replace_all(head, " ");
    let head = LOT_RE.replace_all(&head, " ");

    let mut street_end = head.len();
    let mut number = None;
    if let Some(caps) = NUMBER_RE.captures_iter(&head).last() {
        if let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) {
            if !head[..whole.start()].trim().is_empty() {
                street_end = whole.start();
                number = Some(digits.as_str().split_whitespace().collect::<String>().to_uppercase());
            }
        }
    }

    let street = head[..street_end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    Fragments {
        street: if street.is_empty() { None } else { Some(street) },
        number,
        block,
        lot,
    }
}
