#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use pushr_client::{ClientEvent, Intent, PushrClient, PushrClientOptions, WireMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message;

/// In-process WebSocket server scripted by the test body.
pub struct MockServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    rejecting: Arc<AtomicBool>,
    conns: mpsc::Receiver<ServerConn>,
}

/// One accepted client connection, seen from the server side.
///
/// Dropping the handle closes the underlying socket with an orderly
/// WebSocket close.
pub struct ServerConn {
    incoming: mpsc::Receiver<WireMessage>,
    outgoing: mpsc::Sender<String>,
}

impl ServerConn {
    /// Next frame the client sent, or panic after five seconds.
    pub async fn recv(&mut self) -> WireMessage {
        timeout(Duration::from_secs(5), self.incoming.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client connection closed")
    }

    pub fn try_recv(&mut self) -> Option<WireMessage> {
        self.incoming.try_recv().ok()
    }

    pub async fn send(&self, message: WireMessage) {
        let text = serde_json::to_string(&message).unwrap();
        self.send_raw(text).await;
    }

    /// Sends an arbitrary text frame, valid envelope or not.
    pub async fn send_raw(&self, text: impl Into<String>) {
        self.outgoing
            .send(text.into())
            .await
            .expect("server writer gone");
    }
}

impl MockServer {
    pub async fn start() -> Self {
        Self::start_with_handshake_delay(Duration::ZERO).await
    }

    /// Like [`start`](Self::start), but waits `delay` between accepting TCP
    /// and performing the WebSocket handshake, widening the window a client
    /// spends connecting.
    pub async fn start_with_handshake_delay(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let rejecting = Arc::new(AtomicBool::new(false));
        let (conn_tx, conn_rx) = mpsc::channel(8);

        let counter = Arc::clone(&accepted);
        let reject = Arc::clone(&rejecting);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                if reject.load(Ordering::SeqCst) {
                    drop(stream);
                    continue;
                }
                let conn_tx = conn_tx.clone();
                tokio::spawn(async move {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    serve_connection(stream, conn_tx).await;
                });
            }
        });

        Self {
            addr,
            accepted,
            rejecting,
            conns: conn_rx,
        }
    }

    /// From now on, accepted TCP connections are dropped before the
    /// WebSocket handshake, so further connect attempts fail but are
    /// counted.
    pub fn reject_handshakes(&self) {
        self.rejecting.store(true, Ordering::SeqCst);
    }

    /// Accepts TCP connections and drops them before the WebSocket
    /// handshake completes, so every connect attempt fails but is counted.
    pub async fn start_rejecting() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        (format!("ws://{}/pushr", addr), accepted)
    }

    pub fn url(&self) -> String {
        format!("ws://{}/pushr", self.addr)
    }

    pub fn accept_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub async fn next_conn(&mut self) -> ServerConn {
        timeout(Duration::from_secs(5), self.conns.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("accept loop gone")
    }
}

async fn serve_connection(stream: TcpStream, conn_tx: mpsc::Sender<ServerConn>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(_) => return,
    };
    let (mut sink, mut source) = ws.split();

    let (incoming_tx, incoming_rx) = mpsc::channel(64);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(64);

    if conn_tx
        .send(ServerConn {
            incoming: incoming_rx,
            outgoing: outgoing_tx,
        })
        .await
        .is_err()
    {
        return;
    }

    tokio::spawn(async move {
        while let Some(text) = outgoing_rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        // the test dropped its ServerConn, close the socket gracefully
        let _ = sink.close().await;
    });

    while let Some(Ok(frame)) = source.next().await {
        if let Message::Text(text) = frame {
            if let Ok(message) = serde_json::from_str::<WireMessage>(&text) {
                if incoming_tx.send(message).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Connects a fresh client against a new mock server and consumes the
/// authentication request.
pub async fn connected_client(
    options: PushrClientOptions,
) -> (MockServer, ServerConn, PushrClient) {
    let mut server = MockServer::start().await;
    let client = PushrClient::new(server.url(), options).unwrap();
    client.connect().await.unwrap();

    let mut conn = server.next_conn().await;
    let auth = conn.recv().await;
    assert_eq!(auth.intent, Intent::AuthReq);

    (server, conn, client)
}

/// Waits for the first client event matching the predicate.
pub async fn wait_for_client_event<F>(
    rx: &mut broadcast::Receiver<ClientEvent>,
    mut pred: F,
) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event stream closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for a client event")
}
