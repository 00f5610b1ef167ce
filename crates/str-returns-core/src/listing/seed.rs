use tracing::debug;

use super::extract::ListingExtract;
use crate::calculator::InvestmentInputs;

impl ListingExtract {
    /// Pre-fill simulation inputs from the listing.
    ///
    /// Only the price feeds the calculator; rooms, living space, floor and
    /// renovation year are descriptive. Every field the listing did not
    /// provide keeps its value from `defaults`.
    pub fn seed_inputs(&self, defaults: InvestmentInputs) -> InvestmentInputs {
        match self.price {
            Some(price) => {
                debug!(%price, "seeding property price from listing");
                InvestmentInputs {
                    property_price: price,
                    ..defaults
                }
            }
            None => defaults,
        }
    }
}
