//! Wire types for the DevTools protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct CdpRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

// Events carry a method and no id; both shapes parse into this and events
// are simply dropped by the receive loop.
#[derive(Debug, Deserialize)]
pub(crate) struct CdpResponse {
    pub id: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<CdpErrorPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CdpErrorPayload {
    pub code: i64,
    pub message: String,
}

/// Subset of the `/json/new` discovery payload we care about.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub id: String,
    #[serde(default)]
    pub url: String,
    pub web_socket_debugger_url: String,
}
