use crate::client::Client;
use anyhow::{Context, Result};
use colored::Colorize;

pub async fn health(client: &Client) -> Result<()> {
    let health = client.api.health_check().await;
    let status = if health.is_up() {
        health.status.green()
    } else {
        health.status.red()
    };
    println!("{} {}", client.config.api_base_url, status);
    if !health.details.is_empty() {
        println!("{}", serde_json::to_string_pretty(&health.details)?);
    }
    Ok(())
}

/// Posts a sample payload to the backend's email webhook test endpoint.
pub async fn webhook_test(client: &Client, payload: &str) -> Result<()> {
    if !client.tokens.has_credential() {
        anyhow::bail!("Not signed in. Run `advisor login` to get the sign-in URL.");
    }
    let payload: serde_json::Value =
        serde_json::from_str(payload).context("Payload is not valid JSON")?;
    let response = client.api.test_email_webhook(payload).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
