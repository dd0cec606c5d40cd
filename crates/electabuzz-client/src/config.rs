use std::time::Duration;

/// Default time to wait for one response datagram.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_millis(500);

/// Largest attempt budget callers use for reads.
///
/// [`ClientConfig::default`] starts every operation at 3; pass this to
/// [`ClientConfig::with_attempts`] for the longer read budget.
pub const DEFAULT_ATTEMPTS: u32 = 4;

/// Runtime configuration of a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Time to wait for one datagram before the attempt counts as timed out.
    pub recv_timeout: Duration,
    /// Attempts per multi-read exchange.
    pub read_attempts: u32,
    /// Attempts per single-write exchange.
    pub write_attempts: u32,
    /// Attempts per client-list exchange.
    pub clients_attempts: u32,
    /// Attempts per ping exchange.
    pub ping_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            read_attempts: 3,
            write_attempts: 3,
            clients_attempts: 3,
            ping_attempts: 3,
        }
    }
}

impl ClientConfig {
    /// Default configuration with a custom receive timeout.
    pub fn with_recv_timeout(recv_timeout: Duration) -> Self {
        Self {
            recv_timeout,
            ..Self::default()
        }
    }

    /// Use the same attempt budget for every operation.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.read_attempts = attempts;
        self.write_attempts = attempts;
        self.clients_attempts = attempts;
        self.ping_attempts = attempts;
        self
    }
}

/// How [`connect_verified`](crate::connect_verified) retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPolicy {
    /// Connect-and-verify attempts before giving up.
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}
