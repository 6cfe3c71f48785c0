//! Basic example demonstrating the BaaS API client.
//!
//! Run with:
//! ```
//! BAAS_API_KEY=your-key BAAS_INSTANCE=my-instance cargo run --example basic
//! ```

use baasapi::{BaasClient, Class, Order, PrettyPrint, Properties, Resource, User};
use serde_json::json;

#[tokio::main]
async fn main() -> baasapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating BaaS client...");
    let client = BaasClient::from_env()?;
    println!("Connected to: {}", client.base_url());
    println!("Instance: {}", client.instance().unwrap_or("(none)"));

    // List the newest classes
    println!("\n--- Listing Classes (newest first) ---");
    let classes = Class::please(&client)
        .ordering(Order::Desc)
        .page_size(10)
        .list(Properties::new())
        .await?;
    println!("Found {} classes", classes.len());
    for class in &classes {
        println!("  - {}", class.get_str("name").unwrap_or("?"));
    }

    // Validate locally before anything is sent
    println!("\n--- Validation ---");
    let draft = User::build(Properties::new()).with("username", "demo-user");
    if let Err(errors) = draft.validate() {
        println!("Draft user is invalid: {errors}");
    }

    // Create the user if it doesn't exist yet
    println!("\n--- Get or Create ---");
    let mut lookup = Properties::new();
    lookup.insert("username".to_string(), json!("demo-user"));
    let mut defaults = Properties::new();
    defaults.insert("password".to_string(), json!("change-me"));

    let user = User::please(&client)
        .get_or_create(lookup, defaults)
        .await?;
    println!("{}", user.pretty_print());

    Ok(())
}
