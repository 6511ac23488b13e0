//! Command-line arguments for globe.

use clap::Parser;

/// Print the country list, refreshing the local copy when it is stale
#[derive(Parser, Debug)]
#[command(name = "globe", about = "Country list with a local SQLite cache", version)]
pub struct Args {
    /// Fetch from the network even if the cached list is still fresh
    #[arg(short, long)]
    pub force: bool,
}
