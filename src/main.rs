use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ra_auth::{CredentialSession, RaAuthConfig, RiotAuthClient};
use ra_tls::{RIOT_CLIENT_PROFILE, build_tls_context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn print_session(session: &CredentialSession) {
    println!("Access Token Type: {}\n", session.token_type().unwrap_or("-"));
    println!("Access Token: {}\n", session.access_token().unwrap_or("-"));
    println!("Entitlements Token: {}\n", session.entitlements_token().unwrap_or("-"));
    println!("User ID: {}", session.user_id().unwrap_or("-"));
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let username = std::env::var("RIOT_USERNAME").context("RIOT_USERNAME is not set")?;
    let password = std::env::var("RIOT_PASSWORD").context("RIOT_PASSWORD is not set")?;
    let query_mode = std::env::var("RIOT_QUERY_MODE").is_ok_and(|v| v == "1" || v == "true");

    let tls = Arc::new(build_tls_context(&RIOT_CLIENT_PROFILE).context("Failed to build TLS context")?);
    for gap in tls.gaps() {
        warn!(kind = ?gap.kind, entry = gap.entry, "Handshake differs from the official client");
    }

    let mut client = RiotAuthClient::new(RaAuthConfig::official(), tls)?;
    client
        .authorize(&username, &password, query_mode)
        .await
        .context("Authorization failed")?;
    info!("Successfully authorized");
    print_session(client.session());

    tokio::time::sleep(Duration::from_secs(5)).await;

    client.reauthorize().await.context("Reauthorization failed")?;
    info!("Successfully re-authorized");
    print_session(client.session());

    Ok(())
}
