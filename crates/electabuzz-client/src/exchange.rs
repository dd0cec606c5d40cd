//! Request/response coordination with retransmission.

use std::time::Duration;

use bytes::BytesMut;
use electabuzz_frame::{decode_packet, encode_packet, MessageType, Packet, ResultCode, VERSION};
use electabuzz_transport::{is_refusal, DatagramLink};
use tracing::{debug, trace, warn};

use crate::error::{ClientError, Result};

/// Largest datagram a response can arrive in.
const RECV_BUFFER_SIZE: usize = 64 * 1024;

/// The per-connection state that must only be touched by one exchange at a
/// time: the link and the transaction counter.
pub(crate) struct Session<L> {
    link: L,
    transaction_id: u16,
    recv_buf: Vec<u8>,
}

impl<L: DatagramLink> Session<L> {
    pub(crate) fn new(link: L) -> Self {
        Self {
            link,
            transaction_id: 0,
            recv_buf: vec![0; RECV_BUFFER_SIZE],
        }
    }

    pub(crate) fn into_link(self) -> L {
        self.link
    }

    /// The id of the most recent transaction, 0 before the first one.
    pub(crate) fn transaction_id(&self) -> u16 {
        self.transaction_id
    }

    /// Send `payload` as a `request` packet and wait for an `expected`
    /// response carrying the same transaction id.
    ///
    /// Makes at most `max_attempts` (at least one) receive attempts. A
    /// response with a stale transaction id does not trigger a retransmit;
    /// the next attempt only listens for the answer still in flight.
    pub(crate) async fn exchange(
        &mut self,
        request: MessageType,
        payload: &[u8],
        expected: MessageType,
        max_attempts: u32,
        recv_timeout: Duration,
    ) -> Result<Packet> {
        let transaction_id = self.transaction_id.wrapping_add(1);
        let mut datagram = BytesMut::new();
        encode_packet(transaction_id, request, payload, &mut datagram)?;
        self.transaction_id = transaction_id;

        let attempts = max_attempts.max(1);
        let mut outcome = None;
        let mut transmit = true;

        for attempt in 1..=attempts {
            if transmit {
                if attempt > 1 {
                    debug!(transaction_id, attempt, attempts, %request, "retransmitting");
                }
                if let Err(err) = self.link.send(&datagram).await {
                    warn!(transaction_id, attempt, error = %err, "send failed");
                    outcome = Some(ResultCode::Connection);
                    continue;
                }
            }
            transmit = true;

            let received =
                match tokio::time::timeout(recv_timeout, self.link.recv(&mut self.recv_buf)).await
                {
                    Ok(Ok(len)) => len,
                    Ok(Err(err)) => {
                        if is_refusal(&err) {
                            debug!(transaction_id, attempt, error = %err, "peer refused");
                        } else {
                            warn!(transaction_id, attempt, error = %err, "receive failed");
                        }
                        outcome = Some(ResultCode::Connection);
                        continue;
                    }
                    Err(_) => {
                        debug!(transaction_id, attempt, ?recv_timeout, "no response");
                        outcome = Some(ResultCode::Timeout);
                        continue;
                    }
                };

            let packet = match decode_packet(&self.recv_buf[..received]) {
                Ok(packet) => packet,
                Err(err) => {
                    debug!(transaction_id, attempt, error = %err, "malformed response");
                    outcome = Some(ResultCode::MsgFormat);
                    continue;
                }
            };

            if packet.version != VERSION {
                debug!(transaction_id, version = packet.version, "unsupported version");
                outcome = Some(ResultCode::MsgFormat);
                continue;
            }
            if packet.transaction_id != transaction_id {
                debug!(
                    transaction_id,
                    received = packet.transaction_id,
                    "stale transaction id, listening again"
                );
                outcome = Some(ResultCode::MsgFormat);
                transmit = false;
                continue;
            }
            if packet.message_type == MessageType::Timeout {
                debug!(transaction_id, attempt, "multiplexer reported timeout");
                outcome = Some(ResultCode::Timeout);
                continue;
            }
            if packet.message_type != expected {
                debug!(
                    transaction_id,
                    %expected,
                    received = %packet.message_type,
                    "unexpected response type"
                );
                outcome = Some(ResultCode::MsgFormat);
                continue;
            }

            trace!(transaction_id, attempt, len = received, "response accepted");
            return Ok(packet);
        }

        let outcome = outcome.unwrap_or(ResultCode::Timeout);
        warn!(transaction_id, %request, %outcome, attempts, "exchange exhausted");
        Err(ClientError::Exhausted { outcome, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{datagram, garbage, reply, stale_reply, ScriptedLink, Step};

    const WAIT: Duration = Duration::from_millis(500);

    async fn ping(session: &mut Session<ScriptedLink>, attempts: u32) -> Result<Packet> {
        session
            .exchange(MessageType::PingReq, b"", MessageType::PingRsp, attempts, WAIT)
            .await
    }

    fn exhausted(result: Result<Packet>) -> (ResultCode, u32) {
        match result {
            Err(ClientError::Exhausted { outcome, attempts }) => (outcome, attempts),
            other => panic!("expected exhausted exchange, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transaction_ids_start_at_one_and_increment() {
        let link = ScriptedLink::new((0..3).map(|_| reply(MessageType::PingRsp, b"")));
        let mut session = Session::new(link.clone());

        for expected in 1..=3 {
            let packet = ping(&mut session, 1).await.unwrap();
            assert_eq!(packet.transaction_id, expected);
        }
        let ids: Vec<u16> = link.sent_packets().iter().map(|p| p.transaction_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn transaction_id_wraps_after_ffff() {
        let link = ScriptedLink::new((0..3).map(|_| reply(MessageType::PingRsp, b"")));
        let mut session = Session::new(link.clone());
        session.transaction_id = 0xFFFE;

        for _ in 0..3 {
            ping(&mut session, 1).await.unwrap();
        }
        let ids: Vec<u16> = link.sent_packets().iter().map(|p| p.transaction_id).collect();
        assert_eq!(ids, vec![0xFFFF, 0x0000, 0x0001]);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_exhausts_budget_with_timeout() {
        let link = ScriptedLink::silent();
        let mut session = Session::new(link.clone());

        let started = tokio::time::Instant::now();
        let (outcome, attempts) = exhausted(ping(&mut session, 3).await);
        assert_eq!(outcome, ResultCode::Timeout);
        assert_eq!(attempts, 3);
        assert_eq!(link.sent().len(), 3);
        assert!(started.elapsed() >= WAIT * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retransmits_reuse_transaction_id() {
        let link = ScriptedLink::new([Step::Silence, reply(MessageType::PingRsp, b"")]);
        let mut session = Session::new(link.clone());

        ping(&mut session, 3).await.unwrap();
        let sent = link.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_sends_once() {
        let link = ScriptedLink::silent();
        let mut session = Session::new(link.clone());

        let (outcome, attempts) = exhausted(ping(&mut session, 0).await);
        assert_eq!(outcome, ResultCode::Timeout);
        assert_eq!(attempts, 1);
        assert_eq!(link.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refusal_maps_to_connection() {
        let link = ScriptedLink::new([Step::Refuse, Step::Refuse]);
        let mut session = Session::new(link.clone());

        let (outcome, _) = exhausted(ping(&mut session, 2).await);
        assert_eq!(outcome, ResultCode::Connection);
        assert_eq!(link.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn send_failure_consumes_attempt() {
        let link = ScriptedLink::new([reply(MessageType::PingRsp, b"")]);
        link.fail_sends(1);
        let mut session = Session::new(link.clone());

        let packet = ping(&mut session, 2).await.unwrap();
        assert_eq!(packet.transaction_id, 1);
        assert_eq!(link.sent().len(), 1);

        link.fail_sends(2);
        let (outcome, _) = exhausted(ping(&mut session, 2).await);
        assert_eq!(outcome, ResultCode::Connection);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_suppresses_retransmit() {
        let link = ScriptedLink::new([
            stale_reply(MessageType::PingRsp, b""),
            reply(MessageType::PingRsp, b""),
        ]);
        let mut session = Session::new(link.clone());

        let packet = ping(&mut session, 3).await.unwrap();
        assert_eq!(packet.transaction_id, 1);
        assert_eq!(link.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_then_silence_times_out() {
        let link = ScriptedLink::new([stale_reply(MessageType::PingRsp, b"")]);
        let mut session = Session::new(link.clone());

        let (outcome, _) = exhausted(ping(&mut session, 2).await);
        assert_eq!(outcome, ResultCode::Timeout);
        assert_eq!(link.sent().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_on_last_attempt_reports_msg_format() {
        let link = ScriptedLink::new([Step::Silence, stale_reply(MessageType::PingRsp, b"")]);
        let mut session = Session::new(link.clone());

        let (outcome, _) = exhausted(ping(&mut session, 2).await);
        assert_eq!(outcome, ResultCode::MsgFormat);
    }

    #[tokio::test(start_paused = true)]
    async fn server_timeout_is_retried() {
        let link = ScriptedLink::new([
            reply(MessageType::Timeout, b""),
            reply(MessageType::PingRsp, b""),
        ]);
        let mut session = Session::new(link.clone());

        ping(&mut session, 2).await.unwrap();
        assert_eq!(link.sent().len(), 2);

        let link = ScriptedLink::new([reply(MessageType::Timeout, b"")]);
        let mut session = Session::new(link);
        let (outcome, _) = exhausted(ping(&mut session, 1).await);
        assert_eq!(outcome, ResultCode::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_response_type_is_msg_format() {
        let link = ScriptedLink::new([
            reply(MessageType::ReadDataRsp, b""),
            reply(MessageType::ProcessingError, b""),
        ]);
        let mut session = Session::new(link.clone());

        let (outcome, _) = exhausted(ping(&mut session, 2).await);
        assert_eq!(outcome, ResultCode::MsgFormat);
        assert_eq!(link.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_datagrams_are_retried() {
        let mut foreign_version = datagram(1, MessageType::PingRsp, b"");
        foreign_version[1] = 0x01;
        let foreign_version: &'static [u8] = Vec::leak(foreign_version);

        let link = ScriptedLink::new([
            garbage(&[0x00, 0x00, 0x00]),
            garbage(foreign_version),
            garbage(&[0x00, 0x00, 0x00, 0x01, 0x20, 0x00, 0x00, 0x05, 0xc0]),
            reply(MessageType::PingRsp, b""),
        ]);
        let mut session = Session::new(link.clone());

        ping(&mut session, 4).await.unwrap();
        assert_eq!(link.sent().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_payload_is_rejected_before_sending() {
        let link = ScriptedLink::silent();
        let mut session = Session::new(link.clone());

        let payload = vec![0u8; usize::from(u16::MAX) + 1];
        let err = session
            .exchange(MessageType::WriteDataReq, &payload, MessageType::WriteDataRsp, 3, WAIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Frame(_)));
        assert!(link.sent().is_empty());
        assert_eq!(session.transaction_id(), 0);
    }
}
