//! Tripwire operator CLI
//!
//! Prints the status of every configured breaker as JSON.
//! `tripwire reset` forces every configured breaker closed first.

use tripwire::{log_service_shutdown, TripwireBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let reset = std::env::args().nth(1).is_some_and(|arg| arg == "reset");

	let manager = TripwireBuilder::new().start().await?;
	if reset {
		manager.reset_all().await;
	}

	let statuses = manager.get_all_status().await;
	println!("{}", serde_json::to_string_pretty(&statuses)?);

	log_service_shutdown();
	Ok(())
}
