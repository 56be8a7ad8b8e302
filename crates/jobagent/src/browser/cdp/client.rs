//! WebSocket transport and command dispatch for one page session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::protocol::{CdpRequest, CdpResponse, PageInfo};
use crate::browser::BrowserError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) struct PendingRequest {
    pub tx: oneshot::Sender<Result<Value, BrowserError>>,
}

/// A live DevTools connection to a single page.
pub struct CdpBrowser {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    request_id: AtomicU64,
    _recv_task: tokio::task::JoinHandle<()>,
}

impl CdpBrowser {
    /// Connect to a Chrome debugging endpoint (e.g. `http://127.0.0.1:9222`)
    /// and open a fresh tab for this session.
    pub async fn connect(endpoint: &str) -> Result<Self, BrowserError> {
        let http_endpoint = endpoint.trim_end_matches('/');

        // Chrome requires PUT for /json/new.
        let create_url = format!("{http_endpoint}/json/new");
        debug!("creating page via {}", create_url);
        let client = reqwest::Client::new();
        let page: PageInfo = client
            .put(&create_url)
            .send()
            .await
            .map_err(|err| BrowserError::Unavailable(format!("{endpoint}: {err}")))?
            .json()
            .await
            .map_err(|err| BrowserError::Unavailable(format!("{endpoint}: {err}")))?;

        debug!("created page {} ({})", page.id, page.url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(&page.web_socket_debugger_url)
            .await
            .map_err(|err| BrowserError::Connection(format!("websocket: {err}")))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let ws_tx = Arc::new(tokio::sync::Mutex::new(ws_sink));
        let pending: Arc<Mutex<HashMap<u64, PendingRequest>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let recv_task = {
            let pending = pending.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, pending).await;
            })
        };

        let browser = Self {
            ws_tx,
            pending,
            request_id: AtomicU64::new(1),
            _recv_task: recv_task,
        };

        browser.enable_domains().await?;

        Ok(browser)
    }

    async fn receive_loop(mut ws_source: WsSource, pending: Arc<Mutex<HashMap<u64, PendingRequest>>>) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("cdp recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => {
                            if let Some(id) = resp.id {
                                let pending_req = pending.lock().remove(&id);
                                if let Some(req) = pending_req {
                                    let result = if let Some(error) = resp.error {
                                        Err(BrowserError::Protocol {
                                            code: error.code,
                                            message: error.message,
                                        })
                                    } else {
                                        Ok(resp.result.unwrap_or(Value::Null))
                                    };
                                    let _ = req.tx.send(result);
                                }
                            }
                            // Events carry a method and no id; this session
                            // polls state instead of consuming them.
                        }
                        Err(err) => {
                            warn!("unparseable cdp message: {}", err);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("websocket closed");
                    break;
                }
                Err(err) => {
                    warn!("websocket error: {}", err);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Send one CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
        };

        let json = serde_json::to_string(&request)?;
        trace!("cdp send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await?;
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BrowserError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(BrowserError::Timeout(format!("request {method} timed out")))
            }
        }
    }

    async fn enable_domains(&self) -> Result<(), BrowserError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        Ok(())
    }
}

impl Drop for CdpBrowser {
    fn drop(&mut self) {
        self._recv_task.abort();
    }
}
