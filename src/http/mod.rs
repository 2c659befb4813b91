//! A small HTTP/1 server for the read-only transactions API.
//!
//! - `GET /transactions/` lists transactions, filtered and paginated.
//! - `GET /transactions/report/` builds a pivot report.
//!
//! Responses are JSON. Errors have the shape `{"detail": "..."}`.

mod routes;

use crate::error::Res;
use crate::Config;
use anyhow::Context;
use async_trait::async_trait;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{header, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use routes::route;

/// How long to wait before accepting again after a failed accept, e.g. when the process is out of
/// file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A source of incoming connections.
#[async_trait]
pub(crate) trait Acceptor: Send {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn accept(&mut self) -> std::io::Result<(Self::Stream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> std::io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

/// Binds to `addr` and serves requests until the process is asked to stop.
pub(crate) async fn serve(config: Config, addr: SocketAddr) -> Res<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to listen on {addr}"))?;
    let count = config.db().count_transactions().await?;
    info!(
        "Serving {count} transactions on http://{}",
        listener.local_addr()?
    );
    serve_listener(config, listener, shutdown_signal()).await
}

/// Completes on ctrl-c or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Unable to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received ctrl-c"),
        _ = terminate => debug!("Received SIGTERM"),
    }
}

/// Serves connections from `listener` until `shutdown` completes. A failed accept is logged and
/// retried. Connections that are still open at shutdown are dropped.
pub(crate) async fn serve_listener<A, F>(config: Config, mut listener: A, shutdown: F) -> Res<()>
where
    A: Acceptor,
    F: Future<Output = ()>,
{
    let config = Arc::new(config);
    tokio::pin!(shutdown);
    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = &mut shutdown => {
                info!("Shutting down the HTTP server");
                return Ok(());
            }
        };
        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Unable to accept a connection: {e}");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        tracing::trace!("Accepted a connection from {peer}");

        let config = Arc::clone(&config);
        tokio::spawn(async move {
            let service = service_fn(move |request| handle(Arc::clone(&config), request));
            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!("Connection from {peer} ended with an error: {e}");
            }
        });
    }
}

async fn handle(
    config: Arc<Config>,
    request: Request<Incoming>,
) -> Result<Response<String>, Infallible> {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let response = route(&config, request.method(), request.uri(), host.as_deref()).await;
    info!(
        "{} {} {}",
        request.method(),
        request.uri(),
        response.status().as_u16()
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::io::ErrorKind;
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
    use tokio::sync::{mpsc, oneshot};

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    /// Hands out whatever connections, or accept errors, the test sends it.
    struct Connections(mpsc::UnboundedReceiver<std::io::Result<DuplexStream>>);

    #[async_trait]
    impl Acceptor for Connections {
        type Stream = DuplexStream;

        async fn accept(&mut self) -> std::io::Result<(DuplexStream, SocketAddr)> {
            match self.0.recv().await {
                Some(next) => next.map(|stream| (stream, SocketAddr::from(([127, 0, 0, 1], 9)))),
                None => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_accept_errors_do_not_stop_the_server() {
        let env = TestEnv::with_sample_data().await;
        let (connect, connections) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_listener(
            env.config(),
            Connections(connections),
            async move {
                let _ = stopped.await;
            },
        ));

        for kind in [ErrorKind::ConnectionAborted, ErrorKind::Other] {
            connect.send(Err(std::io::Error::from(kind))).unwrap();
        }
        let (mut client, server_side) = duplex(64 * 1024);
        connect.send(Ok(server_side)).unwrap();

        client
            .write_all(b"GET /transactions/ HTTP/1.1\r\nHost: testserver\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(5), client.read_to_string(&mut response))
            .await
            .expect("No response after accept errors")
            .unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains(r#""count":3"#));
        assert!(!server.is_finished());

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("Server timed out")
            .expect("Server task panicked")
            .unwrap();
    }

    #[tokio::test]
    async fn test_server_round_trip() {
        let env = TestEnv::with_sample_data().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_listener(env.config(), listener, async move {
            let _ = stopped.await;
        }));

        let response = get(addr, "/transactions/?status=unpaid").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains("content-type: application/json"));
        assert!(response.contains(r#""count":2"#));

        let response = get(
            addr,
            "/transactions/report/?row_field=transaction_type&column_fields=status",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains(r#""grand_total":"225.00""#));

        let response = get(addr, "/nowhere/").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");

        stop.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("Server timed out")
            .expect("Server task panicked")
            .unwrap();
    }
}
