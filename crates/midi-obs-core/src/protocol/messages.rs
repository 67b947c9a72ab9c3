//! OBS WebSocket v5 message types.
//!
//! Every frame on the socket is a UTF-8 JSON text frame shaped as
//! `{"op": <op code>, "d": <payload object>}`.  The types in this module model
//! the payloads (`d`) of the op codes this client speaks; the envelope itself
//! is handled by [`crate::protocol::codec`].
//!
//! Field names on the wire are camelCase (`rpcVersion`, `requestId`...), so
//! every payload struct carries `#[serde(rename_all = "camelCase")]`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Protocol constants ────────────────────────────────────────────────────────

/// RPC version this client negotiates in `Identify`.
pub const RPC_VERSION: u32 = 1;

/// `eventSubscriptions` bitmask sent in `Identify`: no server-pushed events.
pub const EVENT_SUBSCRIPTIONS_NONE: u32 = 0;

/// Request type names used by this client.
pub mod request_types {
    /// Lists every scene with its `sceneName` and `sceneIndex`.
    pub const GET_SCENE_LIST: &str = "GetSceneList";
    /// Reports the OBS and obs-websocket versions.
    pub const GET_VERSION: &str = "GetVersion";
}

// ── Op codes ──────────────────────────────────────────────────────────────────

/// Every op code defined by OBS WebSocket v5.
///
/// Op 4 is unassigned in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Hello = 0,
    Identify = 1,
    Identified = 2,
    Reidentify = 3,
    Event = 5,
    Request = 6,
    RequestResponse = 7,
    RequestBatch = 8,
    RequestBatchResponse = 9,
}

impl TryFrom<u8> for OpCode {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0 => Ok(OpCode::Hello),
            1 => Ok(OpCode::Identify),
            2 => Ok(OpCode::Identified),
            3 => Ok(OpCode::Reidentify),
            5 => Ok(OpCode::Event),
            6 => Ok(OpCode::Request),
            7 => Ok(OpCode::RequestResponse),
            8 => Ok(OpCode::RequestBatch),
            9 => Ok(OpCode::RequestBatchResponse),
            _ => Err(()),
        }
    }
}

// ── Handshake payloads ────────────────────────────────────────────────────────

/// `Hello` (op 0, server → client).  First message after the socket opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloMessage {
    /// Version string of the obs-websocket plugin, e.g. `"5.4.2"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_web_socket_version: Option<String>,
    /// Latest RPC version the server supports.
    pub rpc_version: u32,
    /// Present only when the server requires a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

/// Salt and challenge used to derive the `Identify` authentication string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// `Identify` (op 1, client → server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyMessage {
    pub rpc_version: u32,
    /// Omitted entirely from the JSON when no password is in play.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

/// `Identified` (op 2, server → client).  Signals that requests may be sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negotiated_rpc_version: Option<u32>,
}

// ── Request payloads ──────────────────────────────────────────────────────────

/// `Request` (op 6, client → server).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub request_type: String,
    pub request_id: String,
}

/// `RequestResponse` (op 7, server → client).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponseMessage {
    /// Echo of the request type.  OBS always sends it; tests often omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

/// Outcome block of a `RequestResponse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStatus {
    /// `true` when the request succeeded.
    pub result: bool,
    /// OBS status code (100 = success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
    /// Human-readable failure reason, when OBS provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// `responseData` of a successful `GetSceneList` request.
///
/// OBS also sends `currentProgramSceneName` and friends; those are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneListResponse {
    pub scenes: Vec<crate::domain::scene::Scene>,
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// A decoded OBS WebSocket message of one of the op codes this client uses.
#[derive(Debug, Clone, PartialEq)]
pub enum ObsMessage {
    Hello(HelloMessage),
    Identify(IdentifyMessage),
    Identified(IdentifiedMessage),
    Request(RequestMessage),
    RequestResponse(RequestResponseMessage),
}

impl ObsMessage {
    /// Op code carried in the envelope for this message.
    pub fn op_code(&self) -> OpCode {
        match self {
            ObsMessage::Hello(_) => OpCode::Hello,
            ObsMessage::Identify(_) => OpCode::Identify,
            ObsMessage::Identified(_) => OpCode::Identified,
            ObsMessage::Request(_) => OpCode::Request,
            ObsMessage::RequestResponse(_) => OpCode::RequestResponse,
        }
    }

    /// Short name for log lines.
    ///
    /// Logging the whole message would leak the `Identify` auth string.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ObsMessage::Hello(_) => "Hello",
            ObsMessage::Identify(_) => "Identify",
            ObsMessage::Identified(_) => "Identified",
            ObsMessage::Request(_) => "Request",
            ObsMessage::RequestResponse(_) => "RequestResponse",
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
