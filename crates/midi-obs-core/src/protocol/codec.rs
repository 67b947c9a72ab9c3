//! JSON codec for OBS WebSocket v5 envelopes.
//!
//! Wire format (one WebSocket text frame per message):
//! ```text
//! {"op": <u8 op code>, "d": { ...payload... }}
//! ```
//!
//! Decoding is strict about the envelope and the payload shape of the op
//! codes this client understands, and returns [`ProtocolError`] for anything
//! else.  Callers on the receive path are expected to log and drop such
//! frames rather than tear the connection down.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{ObsMessage, OpCode};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame is not JSON, or not an object with a numeric `op`.
    #[error("invalid envelope JSON: {0}")]
    InvalidJson(String),

    /// The op code is valid JSON but not one this client handles.
    #[error("unsupported op code: {0}")]
    UnsupportedOpCode(u64),

    /// The `d` payload does not have the shape its op code requires.
    #[error("malformed payload for op {op}: {reason}")]
    MalformedPayload { op: u8, reason: String },

    /// A message could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    op: u8,
    d: &'a T,
}

#[derive(Deserialize)]
struct RawEnvelope {
    op: u64,
    #[serde(default)]
    d: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`ObsMessage`] into the JSON text of one WebSocket frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use midi_obs_core::protocol::{encode_message, decode_message};
/// use midi_obs_core::protocol::messages::{ObsMessage, RequestMessage};
///
/// let msg = ObsMessage::Request(RequestMessage {
///     request_type: "GetSceneList".to_string(),
///     request_id: "1".to_string(),
/// });
/// let text = encode_message(&msg).unwrap();
/// assert_eq!(decode_message(&text).unwrap(), msg);
/// ```
pub fn encode_message(msg: &ObsMessage) -> Result<String, ProtocolError> {
    let op = msg.op_code() as u8;
    let encoded = match msg {
        ObsMessage::Hello(d) => serde_json::to_string(&Envelope { op, d }),
        ObsMessage::Identify(d) => serde_json::to_string(&Envelope { op, d }),
        ObsMessage::Identified(d) => serde_json::to_string(&Envelope { op, d }),
        ObsMessage::Request(d) => serde_json::to_string(&Envelope { op, d }),
        ObsMessage::RequestResponse(d) => serde_json::to_string(&Envelope { op, d }),
    };
    encoded.map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decodes the text of one WebSocket frame into an [`ObsMessage`].
///
/// The `Identified` payload carries nothing this client needs, so any `d`
/// (including a missing one) is accepted for op 2.
///
/// # Errors
///
/// - [`ProtocolError::InvalidJson`] if the text is not a JSON envelope.
/// - [`ProtocolError::UnsupportedOpCode`] for events, batches, re-identify,
///   and unassigned op codes.
/// - [`ProtocolError::MalformedPayload`] if `d` is missing required fields.
pub fn decode_message(text: &str) -> Result<ObsMessage, ProtocolError> {
    let raw: RawEnvelope =
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;

    let op = u8::try_from(raw.op)
        .ok()
        .and_then(|code| OpCode::try_from(code).ok())
        .ok_or(ProtocolError::UnsupportedOpCode(raw.op))?;

    match op {
        OpCode::Hello => payload(op, raw.d).map(ObsMessage::Hello),
        OpCode::Identify => payload(op, raw.d).map(ObsMessage::Identify),
        OpCode::Identified => Ok(ObsMessage::Identified(
            serde_json::from_value(raw.d).unwrap_or_default(),
        )),
        OpCode::Request => payload(op, raw.d).map(ObsMessage::Request),
        OpCode::RequestResponse => payload(op, raw.d).map(ObsMessage::RequestResponse),
        OpCode::Reidentify
        | OpCode::Event
        | OpCode::RequestBatch
        | OpCode::RequestBatchResponse => Err(ProtocolError::UnsupportedOpCode(raw.op)),
    }
}

fn payload<T: DeserializeOwned>(op: OpCode, d: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(d).map_err(|e| ProtocolError::MalformedPayload {
        op: op as u8,
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
