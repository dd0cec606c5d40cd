use electabuzz_transport::DEFAULT_PORT;
use tracing::{info, warn};

use crate::config::{ClientConfig, VerifyPolicy};
use crate::connection::Connection;
use crate::error::{ClientError, Result};

/// Connect to a multiplexer on the default port with default settings.
pub async fn connect(host: &str) -> Result<Connection> {
    connect_with_config(host, DEFAULT_PORT, ClientConfig::default()).await
}

/// Connect with explicit port and configuration.
pub async fn connect_with_config(
    host: &str,
    port: u16,
    config: ClientConfig,
) -> Result<Connection> {
    Connection::connect(host, port, config).await
}

/// Connect and confirm that the multiplexer answers.
///
/// Each attempt opens a fresh connection and requests the client list. The
/// first connection whose request succeeds is returned.
pub async fn connect_verified(
    host: &str,
    port: u16,
    config: ClientConfig,
    policy: VerifyPolicy,
) -> Result<Connection> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match verify(host, port, config.clone()).await {
            Ok(conn) => {
                info!(host, port, attempt, "multiplexer verified");
                return Ok(conn);
            }
            Err(err) if attempt >= attempts => {
                return Err(ClientError::Unverified {
                    host: host.to_string(),
                    port,
                    attempts,
                    last: Box::new(err),
                });
            }
            Err(err) => {
                warn!(
                    host,
                    port,
                    attempt,
                    attempts,
                    error = %err,
                    "verification failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

async fn verify(host: &str, port: u16, config: ClientConfig) -> Result<Connection> {
    let conn = Connection::connect(host, port, config).await?;
    let (result, _) = conn.get_connected_clients().await?;
    if !result.is_ok() {
        return Err(ClientError::Rejected(result));
    }
    Ok(conn)
}
