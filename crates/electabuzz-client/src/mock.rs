//! Scripted in-memory link for coordinator tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use electabuzz_frame::{decode_packet, encode_packet, MessageType, Packet};
use electabuzz_transport::DatagramLink;

type Responder = Box<dyn Fn(&Packet) -> Vec<u8> + Send + Sync>;

/// What the link does on one `recv` call.
pub(crate) enum Step {
    /// Never deliver anything; the caller's timeout fires.
    Silence,
    /// Fail with `ConnectionRefused`.
    Refuse,
    /// Deliver a datagram built from the most recently sent request.
    Reply(Responder),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Sent(u16),
    Delivered(u16),
}

#[derive(Default)]
struct Script {
    steps: VecDeque<Step>,
    sent: Vec<Vec<u8>>,
    events: Vec<Event>,
    fail_sends: usize,
}

/// A [`DatagramLink`] that plays back a fixed script.
///
/// Clones share state so a test can keep a handle after moving the link
/// into a connection. An exhausted script behaves like [`Step::Silence`].
#[derive(Clone, Default)]
pub(crate) struct ScriptedLink {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLink {
    pub(crate) fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        let link = Self::default();
        link.script.lock().unwrap().steps.extend(steps);
        link
    }

    /// A link that never answers.
    pub(crate) fn silent() -> Self {
        Self::default()
    }

    /// Make the next `count` sends fail.
    pub(crate) fn fail_sends(&self, count: usize) {
        self.script.lock().unwrap().fail_sends = count;
    }

    /// Every datagram transmitted so far.
    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.script.lock().unwrap().sent.clone()
    }

    /// Transmitted datagrams decoded as packets.
    pub(crate) fn sent_packets(&self) -> Vec<Packet> {
        self.sent()
            .iter()
            .map(|d| decode_packet(d).unwrap())
            .collect()
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.script.lock().unwrap().events.clone()
    }
}

impl DatagramLink for ScriptedLink {
    async fn send(&self, datagram: &[u8]) -> io::Result<usize> {
        let mut script = self.script.lock().unwrap();
        if script.fail_sends > 0 {
            script.fail_sends -= 1;
            return Err(io::Error::from(io::ErrorKind::NetworkUnreachable));
        }
        let tid = decode_packet(datagram).unwrap().transaction_id;
        script.sent.push(datagram.to_vec());
        script.events.push(Event::Sent(tid));
        Ok(datagram.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        tokio::task::yield_now().await;
        let step = self.script.lock().unwrap().steps.pop_front();
        match step {
            None | Some(Step::Silence) => std::future::pending::<io::Result<usize>>().await,
            Some(Step::Refuse) => Err(io::Error::from(io::ErrorKind::ConnectionRefused)),
            Some(Step::Reply(respond)) => {
                let mut script = self.script.lock().unwrap();
                let last = script.sent.last().expect("reply scripted before any send");
                let request = decode_packet(last).unwrap();
                let datagram = respond(&request);
                buf[..datagram.len()].copy_from_slice(&datagram);
                script.events.push(Event::Delivered(request.transaction_id));
                Ok(datagram.len())
            }
        }
    }
}

/// Encode a datagram with explicit header fields.
pub(crate) fn datagram(transaction_id: u16, ty: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    encode_packet(transaction_id, ty, payload, &mut buf).unwrap();
    buf.to_vec()
}

/// Answer the request with `ty` and `payload`.
pub(crate) fn reply(ty: MessageType, payload: &'static [u8]) -> Step {
    Step::Reply(Box::new(move |req| datagram(req.transaction_id, ty, payload)))
}

/// Answer with the right type but the previous transaction id.
pub(crate) fn stale_reply(ty: MessageType, payload: &'static [u8]) -> Step {
    Step::Reply(Box::new(move |req| {
        datagram(req.transaction_id.wrapping_sub(1), ty, payload)
    }))
}

/// Answer with a raw byte string regardless of the request.
pub(crate) fn garbage(bytes: &'static [u8]) -> Step {
    Step::Reply(Box::new(move |_| bytes.to_vec()))
}
