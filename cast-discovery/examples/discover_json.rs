//! Simple Cast device discovery that outputs JSON for scripting
//!
//! Usage: cargo run -p castwatch-discovery --example discover_json [timeout_secs]

use cast_discovery::get_with_timeout;
use std::time::Duration;

fn main() {
    let timeout = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);

    let devices = get_with_timeout(Duration::from_secs(timeout));

    match serde_json::to_string_pretty(&devices) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize devices: {}", e),
    }
}
