//! End-to-end tests of the session client over real HTTP.
//!
//! A minimal HTTP/1.1 server runs in-process on a random port. It answers
//! each request from a queue of canned replies, records what it received and
//! closes the connection after every response.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use console::config::ConnectionConfig;
use console::protocol::{AuthScheme, SessionId};
use console::{ClientError, HttpTransport, RecordingSink, SessionClient};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Captured {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

struct Stub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl Stub {
    async fn start(replies: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let replies = Arc::new(Mutex::new(VecDeque::from(replies)));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                // A malformed request only drops that connection.
                let _ = serve(stream, &log, &replies).await;
            }
        });

        Self { addr, requests }
    }

    fn config(&self) -> ConnectionConfig {
        ConnectionConfig {
            host: "127.0.0.1".to_string(),
            port: self.addr.port(),
            ..ConnectionConfig::default()
        }
    }

    fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve(
    stream: TcpStream,
    log: &Mutex<Vec<Captured>>,
    replies: &Mutex<VecDeque<(u16, &'static str)>>,
) -> Option<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.ok()? == 0 {
        return None;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut authorization = None;
    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).await.ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        let (name, value) = header.split_once(':')?;
        let value = value.trim().to_string();
        match name.to_ascii_lowercase().as_str() {
            "authorization" => authorization = Some(value),
            "content-length" => content_length = value.parse().ok()?,
            _ => {}
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await.ok()?;

    log.lock().unwrap().push(Captured {
        method,
        path,
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let (status, reply) = replies.lock().unwrap().pop_front().unwrap_or((500, ""));
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()?;
    Some(())
}

fn session_id(raw: u64) -> SessionId {
    SessionId::new(raw).unwrap()
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let stub = Stub::start(vec![
        (200, r#"{"sessions":[{"id":1,"engine":"python"}]}"#),
        (201, "2"),
        (200, ""),
        (200, "hello\n"),
    ])
    .await;

    let transport = HttpTransport::new(&stub.config()).unwrap();
    let sink = RecordingSink::new();
    let mut client = SessionClient::with_sink(transport, sink.clone());

    let sessions = client.list().await.unwrap().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id(1));
    assert_eq!(sessions[0].engine, "python");

    let created = client.create().await.unwrap().unwrap().id();
    assert_eq!(created, session_id(2));

    let mut session = client.bind(created).await.unwrap().unwrap();
    let output = session.eval("print('hello')").await.unwrap();
    assert_eq!(output, "hello\n");
    drop(session);

    client.close().unwrap();
    assert!(sink.is_empty());

    let requests = stub.requests();
    let seen: Vec<(&str, &str)> = requests
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        seen,
        [
            ("GET", "/geoserver/script/sessions/py"),
            ("POST", "/geoserver/script/sessions/py"),
            ("GET", "/geoserver/script/sessions/py/2"),
            ("PUT", "/geoserver/script/sessions/py/2"),
        ]
    );
    assert_eq!(requests[3].body, "print('hello')");
    for request in &requests {
        assert_eq!(
            request.authorization.as_deref(),
            Some("Basic YWRtaW46Z2Vvc2VydmVy")
        );
    }
}

#[tokio::test]
async fn test_status_mismatch_warns_and_returns_none() {
    let stub = Stub::start(vec![(500, "internal error"), (404, "")]).await;

    let transport = HttpTransport::new(&stub.config()).unwrap();
    let sink = RecordingSink::new();
    let mut client = SessionClient::with_sink(transport, sink.clone());

    assert!(client.list().await.unwrap().is_none());
    assert!(client.bind(session_id(7)).await.unwrap().is_none());
    assert_eq!(
        sink.messages(),
        vec![
            "GET sessions failed, expecting status 200 but got 500",
            "GET session failed, expecting status 200 but got 404",
        ]
    );
}

#[tokio::test]
async fn test_eval_returns_body_of_failed_request() {
    let stub = Stub::start(vec![(200, ""), (500, "Traceback (most recent call last)")]).await;

    let transport = HttpTransport::new(&stub.config()).unwrap();
    let mut client = SessionClient::with_sink(transport, RecordingSink::new());

    let mut session = client.bind(session_id(3)).await.unwrap().unwrap();
    let output = session.eval("1/0").await.unwrap();
    assert_eq!(output, "Traceback (most recent call last)");
}

#[tokio::test]
async fn test_custom_context_and_legacy_auth() {
    let stub = Stub::start(vec![(200, r#"{"sessions":[]}"#)]).await;

    let mut config = stub.config();
    config.context = "gs".to_string();
    config.auth_scheme = AuthScheme::Legacy;
    let transport = HttpTransport::new(&config).unwrap();
    let mut client = SessionClient::with_sink(transport, RecordingSink::new());

    assert_eq!(client.list().await.unwrap(), Some(vec![]));

    let requests = stub.requests();
    assert_eq!(requests[0].path, "/gs/script/sessions/py");
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("QmFzaWMgYWRtaW46Z2Vvc2VydmVy")
    );
}

#[tokio::test]
async fn test_malformed_listing_is_an_error() {
    let stub = Stub::start(vec![(200, "<html>not json</html>")]).await;

    let transport = HttpTransport::new(&stub.config()).unwrap();
    let sink = RecordingSink::new();
    let mut client = SessionClient::with_sink(transport, sink.clone());

    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_connection_refused_propagates() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = ConnectionConfig {
        host: "127.0.0.1".to_string(),
        port,
        ..ConnectionConfig::default()
    };
    let transport = HttpTransport::new(&config).unwrap();
    let sink = RecordingSink::new();
    let mut client = SessionClient::with_sink(transport, sink.clone());

    let err = client.list().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(sink.is_empty());
}
