use std::fmt;
use std::time::Duration;

use electabuzz_frame::{MessageType, Packet, ResultCode};
use electabuzz_transport::{DatagramLink, UdpLink};
use electabuzz_value::{
    checked_id, decode_read_response, decode_roster, decode_write_response, encode_read_request,
    encode_write_request, DataType, DatapointId, ReadResults, Value,
};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::exchange::Session;

/// A client connection to one multiplexer.
///
/// All operations take `&self`; concurrent calls are serialized so that at
/// most one exchange is in flight. Share it between tasks with an `Arc`.
pub struct Connection<L = UdpLink> {
    session: Mutex<Session<L>>,
    config: ClientConfig,
}

impl<L> fmt::Debug for Connection<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Connection<UdpLink> {
    /// Resolve `host`, bind an ephemeral UDP socket and connect it.
    pub async fn connect(host: &str, port: u16, config: ClientConfig) -> Result<Self> {
        let link = UdpLink::connect(host, port).await?;
        Ok(Self::with_link(link, config))
    }
}

impl<L: DatagramLink> Connection<L> {
    /// Wrap an already connected link.
    pub fn with_link(link: L, config: ClientConfig) -> Self {
        Self {
            session: Mutex::new(Session::new(link)),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Release the link. Consuming `self` makes the connection unusable.
    pub fn close(self) -> L {
        info!("closing connection");
        self.session.into_inner().into_link()
    }

    /// The id of the most recent transaction, 0 before the first one.
    pub async fn last_transaction_id(&self) -> u16 {
        self.session.lock().await.transaction_id()
    }

    async fn exchange(
        &self,
        request: MessageType,
        expected: MessageType,
        payload: &[u8],
        attempts: u32,
    ) -> Result<Packet> {
        let mut session = self.session.lock().await;
        session
            .exchange(request, payload, expected, attempts, self.config.recv_timeout)
            .await
    }

    /// Read several datapoints in one exchange.
    ///
    /// The result holds one entry per requested id. Ids the multiplexer did
    /// not mention map to `None`.
    pub async fn multi_read<I>(&self, ids: &[I]) -> Result<ReadResults>
    where
        I: Copy + Into<u64>,
    {
        let ids = ids
            .iter()
            .map(|&raw| {
                let raw = raw.into();
                checked_id(raw).map_err(|_| ClientError::InvalidDatapoint(raw))
            })
            .collect::<Result<Vec<DatapointId>>>()?;

        let payload = encode_read_request(&ids)?;
        let response = self
            .exchange(
                MessageType::ReadDataReq,
                MessageType::ReadDataRsp,
                &payload,
                self.config.read_attempts,
            )
            .await?;
        let results = decode_read_response(&response.payload, &ids)?;
        debug!(
            requested = ids.len(),
            answered = results.outcomes().count(),
            "multi read complete"
        );
        Ok(results)
    }

    /// Write one datapoint, coercing `value` according to `ty` first.
    ///
    /// An id outside `0..=0xFFFF` yields [`ResultCode::WrongParameter`]
    /// without sending anything.
    pub async fn single_write(
        &self,
        id: impl Into<u64>,
        value: impl Into<Value>,
        ty: DataType,
    ) -> Result<ResultCode> {
        let raw = id.into();
        let Ok(id) = checked_id(raw) else {
            debug!(id = raw, "datapoint id out of range, not sending");
            return Ok(ResultCode::WrongParameter);
        };

        let payload = encode_write_request(id, value.into(), ty)?;
        let response = self
            .exchange(
                MessageType::WriteDataReq,
                MessageType::WriteDataRsp,
                &payload,
                self.config.write_attempts,
            )
            .await?;
        let result = decode_write_response(&response.payload, id)?;
        debug!(id, %result, "single write complete");
        Ok(result)
    }

    /// Ask the multiplexer which clients are attached to it.
    pub async fn get_connected_clients(&self) -> Result<(ResultCode, Value)> {
        let response = self
            .exchange(
                MessageType::ClientsReq,
                MessageType::ClientsRsp,
                &[],
                self.config.clients_attempts,
            )
            .await?;
        let roster = decode_roster(&response.payload)?;
        Ok((ResultCode::Ok, roster))
    }

    /// Measure one request/response round trip.
    ///
    /// The measurement includes any retransmissions.
    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        self.exchange(
            MessageType::PingReq,
            MessageType::PingRsp,
            &[],
            self.config.ping_attempts,
        )
        .await?;
        Ok(started.elapsed())
    }
}
