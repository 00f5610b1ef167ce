pub mod eligibility;
pub mod listing;
pub mod sensitivity;
pub mod simulate;
