//! Listing-text adapter.
//!
//! Turns the recognised text of a property-listing screenshot into a partial
//! record of listing attributes. Matching is best effort: a field that cannot
//! be found is simply absent and the input form falls back to its default.

pub mod extract;
pub mod seed;

pub use extract::{extract_fields, extract_listing, ListingExtract};
