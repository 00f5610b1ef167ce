use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;
use tracing::debug;

use crate::types::{with_metadata, ComputationOutput, Money};

/// Oldest renovation year accepted; anything earlier is OCR noise.
const EARLIEST_RENOVATION_YEAR: i32 = 1800;

lazy_static! {
    /// "CHF 1'250'000.–", "CHF 850,000.50", "CHF 600000"
    static ref PRICE_REGEX: Regex = Regex::new(
        r"(?i)\bCHF[ \t]*:?\s*(?P<int>\d{1,3}(?:['’ ,.\x{00A0}\x{2009}\x{202F}]\d{3})+|\d+)(?P<frac>[.,]\d{2})?"
    )
    .expect("Invalid regex pattern");

    /// "Number of rooms: 3.5", "Number of rooms 4,5", "Number of rooms 3½"
    static ref ROOMS_REGEX: Regex = Regex::new(
        r"(?i)\bNumber\s+of\s+rooms\s*:?\s*(?P<value>\d+(?:[.,]\d+)?)(?P<half>[ \t]*½)?"
    )
    .expect("Invalid regex pattern");

    /// "Living space: 85 m²", "Living space 1'200 sqm"
    static ref LIVING_SPACE_REGEX: Regex = Regex::new(
        r"(?i)\bLiving\s+space\s*:?\s*(?P<value>\d{1,3}(?:['’]\d{3})+|\d+)"
    )
    .expect("Invalid regex pattern");

    /// "Year of renovation: 2015"
    static ref RENOVATION_YEAR_REGEX: Regex = Regex::new(
        r"(?i)\bYear\s+of\s+renovation\s*:?\s*(?P<value>\d{4})\b"
    )
    .expect("Invalid regex pattern");

    /// "Floor: 2nd floor", or the label alone with the value on the next line
    static ref FLOOR_REGEX: Regex = Regex::new(
        r"(?im)^[ \t]*Floor\b[ \t]*:?\s*(?P<value>[^\r\n]*\S)"
    )
    .expect("Invalid regex pattern");
}

/// Listing attributes recovered from recognised text. Every field is
/// optional; an absent field means the label was not found or its value
/// could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingExtract {
    /// Asking price (CHF)
    #[serde(default)]
    pub price: Option<Money>,
    /// Number of rooms; half rooms are common (3.5)
    #[serde(default)]
    pub rooms: Option<Decimal>,
    /// Living space in square metres
    #[serde(default)]
    pub living_space: Option<u32>,
    #[serde(default)]
    pub renovation_year: Option<i32>,
    /// Floor as written in the listing ("Ground floor", "2nd floor")
    #[serde(default)]
    pub floor: Option<String>,
}

impl ListingExtract {
    /// Names of the fields that were not found.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.price.is_none() {
            missing.push("price");
        }
        if self.rooms.is_none() {
            missing.push("rooms");
        }
        if self.living_space.is_none() {
            missing.push("living_space");
        }
        if self.renovation_year.is_none() {
            missing.push("renovation_year");
        }
        if self.floor.is_none() {
            missing.push("floor");
        }
        missing
    }

    pub fn is_empty(&self) -> bool {
        self.missing_fields().len() == 5
    }
}

/// Match every labelled field in `text`.
pub fn extract_fields(text: &str) -> ListingExtract {
    let extract = ListingExtract {
        price: PRICE_REGEX.captures(text).and_then(|c| parse_price(&c)),
        rooms: ROOMS_REGEX.captures(text).and_then(|c| parse_rooms(&c)),
        living_space: LIVING_SPACE_REGEX
            .captures(text)
            .and_then(|c| parse_whole_number(&c["value"]))
            .filter(|v| *v > 0),
        renovation_year: RENOVATION_YEAR_REGEX
            .captures(text)
            .and_then(|c| c["value"].parse::<i32>().ok())
            .filter(|y| (EARLIEST_RENOVATION_YEAR..=Utc::now().year()).contains(y)),
        floor: FLOOR_REGEX
            .captures(text)
            .map(|c| c["value"].trim().to_string())
            .filter(|f| !f.is_empty()),
    };

    debug!(
        missing = ?extract.missing_fields(),
        "listing fields extracted"
    );
    extract
}

/// Extract listing fields and report the ones that fall back to defaults.
///
/// Never fails: unreadable text yields an empty extract with a warning per
/// missing field.
pub fn extract_listing(text: &str) -> ComputationOutput<ListingExtract> {
    let start = Instant::now();
    let extract = extract_fields(text);

    let warnings = extract
        .missing_fields()
        .into_iter()
        .map(|f| format!("No {f} found in listing text; the form default applies"))
        .collect();

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Labelled-field pattern matching on recognised listing text",
        &serde_json::json!({
            "labels": ["CHF", "Number of rooms", "Living space", "Year of renovation", "Floor"],
            "text_length": text.chars().count(),
        }),
        warnings,
        elapsed,
        extract,
    )
}

fn parse_price(c: &Captures<'_>) -> Option<Money> {
    let digits: String = c["int"].chars().filter(|ch| ch.is_ascii_digit()).collect();
    let mut price = Decimal::from_str(&digits).ok()?;
    if let Some(frac) = c.name("frac") {
        let cents = Decimal::from_str(&frac.as_str()[1..]).ok()?;
        price += cents / dec!(100);
    }
    (price > Decimal::ZERO).then_some(price)
}

fn parse_rooms(c: &Captures<'_>) -> Option<Decimal> {
    let mut rooms = Decimal::from_str(&c["value"].replace(',', ".")).ok()?;
    if c.name("half").is_some() {
        rooms += dec!(0.5);
    }
    (rooms > Decimal::ZERO).then_some(rooms)
}

/// Digits only, thousands separators dropped.
fn parse_whole_number(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
    digits.parse().ok()
}
