use clap::Args;
use serde_json::Value;

use str_returns_core::listing;

use crate::input;

/// Arguments for listing-text extraction
#[derive(Args)]
pub struct ExtractListingArgs {
    /// Path to the recognised listing text (reads stdin when omitted)
    #[arg(long)]
    pub file: Option<String>,
}

pub fn run_extract_listing(args: ExtractListingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let text = if let Some(ref path) = args.file {
        input::file::read_text(path)?
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        text
    } else {
        return Err("--file <listing.txt> or stdin required for listing extraction".into());
    };

    let result = listing::extract_listing(&text);
    Ok(serde_json::to_value(result)?)
}
