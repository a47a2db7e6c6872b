//! Example: A full session against the mock backend
//!
//! Runs login, a few requests and logout with networking disabled, so no
//! backend is required.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example mock_session
//! ```

use serde_json::{json, Value};
use tollgate_domain::ClientConfig;
use tollgate_infra::TollgateClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut config = ClientConfig::mock("demo-client-key");
    config.storage.use_keychain = false;
    let client = TollgateClient::from_config(config)?;

    println!("Mock Session Example");
    println!("====================\n");

    client.login("demo", "demo-password").await?;
    println!("Logged in: {}", client.is_authenticated());

    let profile = client.get::<Value>("/users/me").await?;
    println!("Profile: {}", serde_json::to_string_pretty(&profile.data)?);

    let created = client.post::<_, Value>("/notes", &json!({ "text": "hello" })).await?;
    println!("Created: {} ({})", created.message, created.status_code);

    println!("Healthy: {}", client.health_check().await);

    client.logout().await;
    println!("Logged in after logout: {}", client.is_authenticated());

    Ok(())
}
