#![cfg(feature = "listing")]

use rust_decimal_macros::dec;
use str_returns_core::calculator::{self, InvestmentInputs};
use str_returns_core::listing::{extract_fields, extract_listing};
use str_returns_core::CostModel;

/// Text as it comes out of OCR for a typical portal screenshot: labels and
/// values split across lines, stray symbols and a second price further down.
const OCR_SCREENSHOT: &str = "\
< Back to results
Grindelwald, 3818
4.5 rooms, 112 m²
CHF 1’480’000.–
Main information
Number of rooms
4.5
Floor
3rd floor
Living space
112 m²
Year of renovation
2019
Garage space CHF 40'000
";

#[test]
fn test_ocr_screenshot_fields() {
    let e = extract_fields(OCR_SCREENSHOT);
    assert_eq!(e.price, Some(dec!(1480000)));
    assert_eq!(e.rooms, Some(dec!(4.5)));
    assert_eq!(e.living_space, Some(112));
    assert_eq!(e.renovation_year, Some(2019));
    assert_eq!(e.floor.as_deref(), Some("3rd floor"));
    assert!(e.missing_fields().is_empty());
}

#[test]
fn test_extracted_price_feeds_simulation() {
    let inputs = extract_fields(OCR_SCREENSHOT).seed_inputs(InvestmentInputs::default());
    let r = calculator::calculate(&inputs, &CostModel::default()).unwrap();
    assert_eq!(r.initial_equity, dec!(296000));
    assert_eq!(r.mortgage_principal, dec!(1184000));
}

#[test]
fn test_unreadable_text_falls_back_to_defaults() {
    let out = extract_listing("@@ ## ~~");
    assert!(out.result.is_empty());
    assert_eq!(out.warnings.len(), 5);

    let inputs = out.result.seed_inputs(InvestmentInputs::default());
    assert_eq!(inputs, InvestmentInputs::default());
}
