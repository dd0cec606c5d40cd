//! Line-based TCP bridge in front of one multiplexer connection.
//!
//! Each text client sends `r <hex id>` or `w <hex id> <values...>` lines and
//! gets one `<<< ...` line back per command.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use electabuzz_client::{connect_verified, ClientError, Connection, VerifyPolicy};
use electabuzz_frame::ResultCode;
use electabuzz_transport::DatagramLink;
use electabuzz_value::{DataType, ReadOutcome, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cmd::{parse_datapoint_id, BridgeArgs, TargetArgs};
use crate::convert::parse_values;
use crate::exit::{client_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};

pub const GREETING: &str = ">> Connected to Electabuzz bridge\n";

const USAGE_TEXT: &str = "<<< Usage:\n r <hex_dp>\n w <hex_dp> <values>\n";

/// The datapoint operations the bridge needs from a multiplexer.
pub trait DatapointGateway: Send + Sync {
    /// Read one datapoint. `None` means the multiplexer did not report it.
    fn read(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<ReadOutcome>, ClientError>> + Send;

    fn write(
        &self,
        id: u64,
        value: Value,
        ty: DataType,
    ) -> impl Future<Output = Result<ResultCode, ClientError>> + Send;
}

impl<L: DatagramLink> DatapointGateway for Connection<L> {
    async fn read(&self, id: u64) -> Result<Option<ReadOutcome>, ClientError> {
        let results = self.multi_read(&[id]).await?;
        Ok(u16::try_from(id).ok().and_then(|id| results.get(id).cloned()))
    }

    async fn write(&self, id: u64, value: Value, ty: DataType) -> Result<ResultCode, ClientError> {
        self.single_write(id, value, ty).await
    }
}

/// Declared datapoint types, loaded from a JSON object such as
/// `{"0x3107": "bool", "0x3108": "EB_TYPE_UINT16"}`.
#[derive(Debug, Clone, Default)]
pub struct TypeMap {
    types: HashMap<u64, DataType>,
}

impl TypeMap {
    pub fn from_json(text: &str) -> Result<Self, String> {
        let raw: HashMap<String, String> =
            serde_json::from_str(text).map_err(|err| format!("invalid type map: {err}"))?;
        let mut types = HashMap::with_capacity(raw.len());
        for (key, name) in raw {
            let id = parse_datapoint_id(&key)?;
            let ty = name.parse::<DataType>().map_err(|err| err.to_string())?;
            types.insert(id, ty);
        }
        Ok(Self { types })
    }

    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        Self::from_json(&text)
            .map_err(|err| CliError::new(DATA_INVALID, format!("{}: {err}", path.display())))
    }

    /// Declared type of `id`; undeclared datapoints are doubles.
    pub fn type_of(&self, id: u64) -> DataType {
        self.types.get(&id).copied().unwrap_or(DataType::Double)
    }

    /// Number of datapoints with a declared type.
    pub fn declared(&self) -> usize {
        self.types.len()
    }
}

/// What to do after one input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Send(String),
    Nothing,
    Close,
}

pub async fn run(args: BridgeArgs, target: &TargetArgs) -> CliResult<i32> {
    let types = match &args.type_map {
        Some(path) => TypeMap::load(path)?,
        None => TypeMap::default(),
    };
    debug!(declared = types.declared(), "datapoint types loaded");

    let policy = VerifyPolicy {
        attempts: args.verify_attempts,
        ..VerifyPolicy::default()
    };
    let conn = connect_verified(&target.host, target.port, target.config(), policy)
        .await
        .map_err(|err| client_error("connect failed", err))?;
    info!(host = %target.host, port = target.port, "connected to multiplexer");

    let listener = TcpListener::bind(args.listen)
        .await
        .map_err(|err| io_error(&format!("bind {} failed", args.listen), err))?;
    info!(addr = %args.listen, "bridge listening");

    serve(listener, Arc::new(conn), Arc::new(types), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;
    Ok(SUCCESS)
}

/// Accept text clients until `shutdown` completes.
pub async fn serve<G>(
    listener: TcpListener,
    gateway: Arc<G>,
    types: Arc<TypeMap>,
    shutdown: impl Future<Output = ()>,
) where
    G: DatapointGateway + 'static,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("bridge shutting down");
                return;
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                info!(%peer, "bridge client connected");
                let gateway = Arc::clone(&gateway);
                let types = Arc::clone(&types);
                tokio::spawn(async move {
                    if let Err(err) = session(stream, gateway.as_ref(), &types).await {
                        warn!(%peer, error = %err, "bridge session failed");
                    }
                    info!(%peer, "bridge client disconnected");
                });
            }
        }
    }
}

/// Serve one text client until it disconnects or says `exit`/`quit`.
pub async fn session<S, G>(stream: S, gateway: &G, types: &TypeMap) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    G: DatapointGateway,
{
    let (reader, mut writer) = tokio::io::split(stream);
    writer.write_all(GREETING.as_bytes()).await?;

    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        debug!(command = line.trim(), "bridge command");
        match handle_line(gateway, types, &line).await {
            Reply::Send(text) => writer.write_all(text.as_bytes()).await?,
            Reply::Nothing => {}
            Reply::Close => break,
        }
    }
    writer.shutdown().await
}

pub async fn handle_line<G: DatapointGateway>(gateway: &G, types: &TypeMap, line: &str) -> Reply {
    let line = line.trim();
    if line.is_empty() {
        return Reply::Nothing;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Reply::Close;
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let op = parts[0].to_ascii_lowercase();
    let text = match (op.as_str(), parts.len()) {
        ("r", 2) => handle_read(gateway, parts[1]).await,
        ("w", n) if n >= 3 => handle_write(gateway, types, parts[1], &parts[2..]).await,
        _ => USAGE_TEXT.to_string(),
    };
    Reply::Send(text)
}

async fn handle_read<G: DatapointGateway>(gateway: &G, raw_id: &str) -> String {
    let id = match parse_datapoint_id(raw_id) {
        Ok(id) => id,
        Err(err) => return format!("<<< ERROR: {err}\n"),
    };
    match gateway.read(id).await {
        Ok(Some(outcome)) => {
            let value = outcome
                .value
                .as_ref()
                .map_or_else(|| Value::Nil.to_string(), Value::to_string);
            format!("<<< READ 0x{id:04X} = {value} ({})\n", outcome.result_code)
        }
        Ok(None) => format!("<<< Failed to read 0x{id:04X}\n"),
        Err(err) => {
            debug!(id, error = %err, "bridge read failed");
            format!("<<< Failed to read 0x{id:04X}\n")
        }
    }
}

async fn handle_write<G: DatapointGateway>(
    gateway: &G,
    types: &TypeMap,
    raw_id: &str,
    raw_values: &[&str],
) -> String {
    let id = match parse_datapoint_id(raw_id) {
        Ok(id) => id,
        Err(err) => return format!("<<< ERROR: {err}\n"),
    };
    let ty = types.type_of(id);
    let value = match parse_values(ty, raw_values) {
        Ok(value) => value,
        Err(err) => return format!("<<< Invalid value for {ty}: {err}\n"),
    };

    match gateway.write(id, value.clone(), ty).await {
        Ok(ResultCode::Ok) => format!("<<< WROTE 0x{id:04X} = {value} ({})\n", ResultCode::Ok),
        Ok(code) => format!("<<< WRITE 0x{id:04X} ERR {code}\n"),
        Err(ClientError::Exhausted { .. }) => {
            format!("<<< WROTE 0x{id:04X} = {value} (no response)\n")
        }
        Err(err) => format!("<<< ERROR: {err}\n"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::AsyncReadExt;

    use super::*;

    #[derive(Default)]
    struct MockGateway {
        outcomes: HashMap<u64, ReadOutcome>,
        write_result: Option<ResultCode>,
        writes: Mutex<Vec<(u64, Value, DataType)>>,
    }

    impl DatapointGateway for MockGateway {
        async fn read(&self, id: u64) -> Result<Option<ReadOutcome>, ClientError> {
            if id > 0xFFFF {
                return Err(ClientError::InvalidDatapoint(id));
            }
            Ok(self.outcomes.get(&id).cloned())
        }

        async fn write(
            &self,
            id: u64,
            value: Value,
            ty: DataType,
        ) -> Result<ResultCode, ClientError> {
            self.writes.lock().unwrap().push((id, value, ty));
            self.write_result.ok_or(ClientError::Exhausted {
                outcome: ResultCode::Timeout,
                attempts: 3,
            })
        }
    }

    fn gateway() -> MockGateway {
        let mut outcomes = HashMap::new();
        outcomes.insert(
            0x3107,
            ReadOutcome {
                datapoint_id: 0x3107,
                result_code: ResultCode::Ok,
                value: Some(Value::F64(21.5)),
                element_count: 1,
            },
        );
        outcomes.insert(
            0x0001,
            ReadOutcome {
                datapoint_id: 0x0001,
                result_code: ResultCode::NotFound,
                value: None,
                element_count: 0,
            },
        );
        MockGateway {
            outcomes,
            write_result: Some(ResultCode::Ok),
            ..MockGateway::default()
        }
    }

    async fn reply(gateway: &MockGateway, types: &TypeMap, line: &str) -> String {
        match handle_line(gateway, types, line).await {
            Reply::Send(text) => text,
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_formats_value_and_result() {
        let gw = gateway();
        let types = TypeMap::default();

        assert_eq!(
            reply(&gw, &types, "r 3107").await,
            "<<< READ 0x3107 = 21.5 (EB_OK)\n"
        );
        assert_eq!(
            reply(&gw, &types, "R 0x1").await,
            "<<< READ 0x0001 = nil (EB_ERR_NOT_FOUND)\n"
        );
        assert_eq!(
            reply(&gw, &types, "r 2222").await,
            "<<< Failed to read 0x2222\n"
        );
        assert_eq!(
            reply(&gw, &types, "r 10000").await,
            "<<< Failed to read 0x10000\n"
        );
    }

    #[tokio::test]
    async fn write_converts_by_declared_type() {
        let gw = gateway();
        let types = TypeMap::from_json(r#"{"0x0010": "bool", "0x0020": "EB_TYPE_UINT16"}"#)
            .unwrap();

        assert_eq!(
            reply(&gw, &types, "w 10 on").await,
            "<<< WROTE 0x0010 = true (EB_OK)\n"
        );
        assert_eq!(
            reply(&gw, &types, "w 20 7 8").await,
            "<<< WROTE 0x0020 = [7, 8] (EB_OK)\n"
        );
        assert_eq!(
            reply(&gw, &types, "w 3107 3").await,
            "<<< WROTE 0x3107 = 3.0 (EB_OK)\n"
        );

        let writes = gw.writes.lock().unwrap();
        assert_eq!(writes[0], (0x10, Value::Bool(true), DataType::Bool));
        assert_eq!(
            writes[1],
            (0x20, Value::from(vec![7i64, 8]), DataType::U16)
        );
        assert_eq!(writes[2], (0x3107, Value::F64(3.0), DataType::Double));
    }

    #[tokio::test]
    async fn write_reports_errors() {
        let mut gw = gateway();
        let types = TypeMap::default();

        assert_eq!(
            reply(&gw, &types, "w 3107 abc").await,
            "<<< Invalid value for double: 'abc': invalid float literal\n"
        );

        gw.write_result = Some(ResultCode::ReadOnly);
        assert_eq!(
            reply(&gw, &types, "w 3107 1").await,
            "<<< WRITE 0x3107 ERR EB_ERR_READ_ONLY\n"
        );

        gw.write_result = None;
        assert_eq!(
            reply(&gw, &types, "w 3107 1").await,
            "<<< WROTE 0x3107 = 1.0 (no response)\n"
        );

        assert_eq!(
            reply(&gw, &types, "w xyz 1").await,
            "<<< ERROR: invalid hex datapoint id: xyz\n"
        );
    }

    #[tokio::test]
    async fn malformed_commands_get_usage() {
        let gw = gateway();
        let types = TypeMap::default();

        assert_eq!(reply(&gw, &types, "r").await, USAGE_TEXT);
        assert_eq!(reply(&gw, &types, "w 3107").await, USAGE_TEXT);
        assert_eq!(reply(&gw, &types, "status").await, USAGE_TEXT);
        assert_eq!(handle_line(&gw, &types, "   ").await, Reply::Nothing);
        assert_eq!(handle_line(&gw, &types, "QUIT").await, Reply::Close);
        assert_eq!(handle_line(&gw, &types, "exit").await, Reply::Close);
    }

    #[test]
    fn type_map_rejects_unknown_types() {
        assert!(TypeMap::from_json(r#"{"0x10": "quaternion"}"#).is_err());
        assert!(TypeMap::from_json(r#"{"zz": "bool"}"#).is_err());
        assert!(TypeMap::from_json("[]").is_err());

        let types = TypeMap::from_json(r#"{"10": "float"}"#).unwrap();
        assert_eq!(types.type_of(0x10), DataType::Float);
        assert_eq!(types.type_of(0x11), DataType::Double);
    }

    #[tokio::test]
    async fn session_greets_and_stops_on_quit() {
        let gw = gateway();
        let types = TypeMap::default();
        let (client, server) = tokio::io::duplex(1024);

        let (mut client_rx, mut client_tx) = tokio::io::split(client);
        client_tx
            .write_all(b"r 3107\n\nquit\nr 3107\n")
            .await
            .unwrap();

        session(server, &gw, &types).await.unwrap();

        let mut transcript = String::new();
        client_rx.read_to_string(&mut transcript).await.unwrap();
        assert_eq!(
            transcript,
            format!("{GREETING}<<< READ 0x3107 = 21.5 (EB_OK)\n")
        );
    }

    #[tokio::test]
    async fn serve_handles_tcp_clients() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve(
            listener,
            Arc::new(gateway()),
            Arc::new(TypeMap::default()),
            async move {
                let _ = stop_rx.await;
            },
        ));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"w 3107 2.5\nexit\n").await.unwrap();
        let mut transcript = String::new();
        stream.read_to_string(&mut transcript).await.unwrap();
        assert_eq!(
            transcript,
            format!("{GREETING}<<< WROTE 0x3107 = 2.5 (EB_OK)\n")
        );

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }
}
