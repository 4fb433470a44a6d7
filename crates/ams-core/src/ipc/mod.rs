//! Fixed-layout request record codec and frame helpers.
//!
//! The manager's IPC front end receives fixed-size request records over a
//! Unix socket and replies with a status. Transport framing is a length
//! prefix; the record layout inside a frame is part of the wire contract
//! and must not change:
//!
//! ```text
//! +----------------------+------------------------------------------+
//! | Length (4 bytes, BE) | Payload                                  |
//! +----------------------+------------------------------------------+
//!
//! Request payload:
//! +-----------+------------------+-------------+-----------+
//! | msgId: u8 | msgValue: u32 BE | len: u16 BE | data[len] |
//! +-----------+------------------+-------------+-----------+
//!
//! Response payload:
//! +----------------+----------------------------+
//! | status: i32 BE | element JSON (may be empty)|
//! +----------------+----------------------------+
//! ```
//!
//! # Bit packing
//!
//! - `ABILITY_TRANSACTION_DONE`: `msgValue` byte 0 = token (low byte),
//!   byte 1 = lifecycle state.
//! - `TERMINATE_ABILITY` / `TERMINATE_APP`: `msgValue` low 16 bits = token.
//!
//! Raw integers stop at this boundary: inbound records decode into the
//! typed [`AmsRequest`] before they reach the orchestrator.
//!
//! `data` carries a JSON-encoded [`Want`] for `START_ABILITY` and a UTF-8
//! bundle name for `TERMINATE_APP_BY_BUNDLENAME`; it is empty otherwise.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::record::LifecycleState;
use crate::want::{ElementName, Want};

/// Maximum frame size. Requests are small records; anything larger is a
/// protocol violation.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Message identifiers of the request record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgId {
    /// Start an ability described by a want.
    StartAbility = 0,
    /// Gracefully terminate the ability holding a token.
    TerminateAbility = 1,
    /// Asynchronous lifecycle completion report.
    AbilityTransactionDone = 2,
    /// Force-stop the application holding a token.
    TerminateApp = 3,
    /// Force-stop the application owning a bundle name.
    TerminateAppByBundleName = 4,
    /// Query the authoritative foreground identity.
    GetTopAbility = 5,
}

impl MsgId {
    /// Decodes a wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::StartAbility),
            1 => Some(Self::TerminateAbility),
            2 => Some(Self::AbilityTransactionDone),
            3 => Some(Self::TerminateApp),
            4 => Some(Self::TerminateAppByBundleName),
            5 => Some(Self::GetTopAbility),
            _ => None,
        }
    }
}

/// Typed request decoded at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmsRequest {
    /// Start an ability.
    StartAbility {
        /// Launch intent; the encoder owns a private copy.
        want: Want,
    },
    /// Graceful termination of the given token.
    TerminateAbility {
        /// Target identity token.
        token: u16,
    },
    /// Lifecycle completion for a token.
    ///
    /// The wire packs the token into a single byte, so external completion
    /// senders can only address tokens up to 255. In-process completions
    /// bypass the record entirely and carry full 16-bit tokens.
    LifecycleDone {
        /// Reporting token (low byte on the wire).
        token: u16,
        /// Confirmed state.
        state: LifecycleState,
    },
    /// Ungraceful teardown of the given token.
    ForceStopApp {
        /// Target identity token.
        token: u16,
    },
    /// Ungraceful teardown of whichever record owns the bundle.
    ForceStopBundle {
        /// Target bundle name.
        bundle_name: String,
    },
    /// Foreground identity query.
    GetTopAbility,
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmsResponse {
    /// `0` on success, a negative [`crate::error::ErrorCode`] status
    /// otherwise.
    pub status: i32,
    /// Foreground identity, only populated for `GET_TOP_ABILITY`.
    pub element: Option<ElementName>,
}

impl AmsResponse {
    /// Successful status-only reply.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: crate::error::STATUS_OK,
            element: None,
        }
    }

    /// Error reply with the given wire status.
    #[must_use]
    pub const fn error(status: i32) -> Self {
        Self {
            status,
            element: None,
        }
    }
}

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame exceeds [`MAX_FRAME_SIZE`].
    #[error("frame too large: {size} bytes (max: {max})")]
    FrameTooLarge {
        /// Declared payload size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Unknown `msgId` byte.
    #[error("unknown message id: {0}")]
    UnknownMessage(u8),

    /// Structurally invalid record.
    #[error("malformed request record: {0}")]
    Malformed(&'static str),

    /// Invalid JSON in the data field.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Peer closed the connection mid-frame.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Packs a transaction-done `msgValue`: byte 0 = token low byte, byte 1 =
/// state.
#[must_use]
pub const fn pack_transaction_value(token: u16, state: LifecycleState) -> u32 {
    ((state as u32) << 8) | (token as u32 & 0xFF)
}

/// Unpacks a transaction-done `msgValue`.
#[must_use]
pub const fn unpack_transaction_value(msg_value: u32) -> (u16, Option<LifecycleState>) {
    let token = (msg_value & 0xFF) as u16;
    let state = LifecycleState::from_u8(((msg_value >> 8) & 0xFF) as u8);
    (token, state)
}

/// Packs a termination `msgValue`: low 16 bits = token.
#[must_use]
pub const fn pack_token_value(token: u16) -> u32 {
    token as u32
}

/// Unpacks a termination `msgValue`.
#[must_use]
pub const fn unpack_token_value(msg_value: u32) -> u16 {
    (msg_value & 0xFFFF) as u16
}

/// Encodes a typed request into its wire record.
///
/// # Errors
///
/// Returns [`IpcError::Serialization`] if the want cannot be encoded and
/// [`IpcError::Malformed`] if the data field would overflow its 16-bit
/// length.
pub fn encode_request(request: &AmsRequest) -> Result<Vec<u8>, IpcError> {
    let (msg_id, msg_value, data): (MsgId, u32, Vec<u8>) = match request {
        AmsRequest::StartAbility { want } => {
            (MsgId::StartAbility, 0, serde_json::to_vec(want)?)
        },
        AmsRequest::TerminateAbility { token } => {
            (MsgId::TerminateAbility, pack_token_value(*token), Vec::new())
        },
        AmsRequest::LifecycleDone { token, state } => (
            MsgId::AbilityTransactionDone,
            pack_transaction_value(*token, *state),
            Vec::new(),
        ),
        AmsRequest::ForceStopApp { token } => {
            (MsgId::TerminateApp, pack_token_value(*token), Vec::new())
        },
        AmsRequest::ForceStopBundle { bundle_name } => (
            MsgId::TerminateAppByBundleName,
            0,
            bundle_name.clone().into_bytes(),
        ),
        AmsRequest::GetTopAbility => (MsgId::GetTopAbility, 0, Vec::new()),
    };

    let len = u16::try_from(data.len()).map_err(|_| IpcError::Malformed("data too long"))?;
    let mut record = Vec::with_capacity(7 + data.len());
    record.push(msg_id as u8);
    record.extend_from_slice(&msg_value.to_be_bytes());
    record.extend_from_slice(&len.to_be_bytes());
    record.extend_from_slice(&data);
    Ok(record)
}

/// Decodes a wire record into a typed request.
///
/// # Errors
///
/// Returns a codec error for truncated records, unknown message ids,
/// length mismatches, or invalid data payloads.
pub fn decode_request(record: &[u8]) -> Result<AmsRequest, IpcError> {
    if record.len() < 7 {
        return Err(IpcError::Malformed("record shorter than header"));
    }
    let msg_id = MsgId::from_u8(record[0]).ok_or(IpcError::UnknownMessage(record[0]))?;
    let msg_value = u32::from_be_bytes([record[1], record[2], record[3], record[4]]);
    let len = u16::from_be_bytes([record[5], record[6]]) as usize;
    let data = &record[7..];
    if data.len() != len {
        return Err(IpcError::Malformed("data length mismatch"));
    }

    match msg_id {
        MsgId::StartAbility => {
            let want: Want = serde_json::from_slice(data)?;
            Ok(AmsRequest::StartAbility { want })
        },
        MsgId::TerminateAbility => Ok(AmsRequest::TerminateAbility {
            token: unpack_token_value(msg_value),
        }),
        MsgId::AbilityTransactionDone => {
            let (token, state) = unpack_transaction_value(msg_value);
            let state = state.ok_or(IpcError::Malformed("unknown lifecycle state"))?;
            Ok(AmsRequest::LifecycleDone { token, state })
        },
        MsgId::TerminateApp => Ok(AmsRequest::ForceStopApp {
            token: unpack_token_value(msg_value),
        }),
        MsgId::TerminateAppByBundleName => {
            let bundle_name = std::str::from_utf8(data)
                .map_err(|_| IpcError::Malformed("bundle name is not UTF-8"))?
                .to_string();
            Ok(AmsRequest::ForceStopBundle { bundle_name })
        },
        MsgId::GetTopAbility => Ok(AmsRequest::GetTopAbility),
    }
}

/// Encodes a reply payload.
///
/// # Errors
///
/// Returns [`IpcError::Serialization`] if the element cannot be encoded.
pub fn encode_response(response: &AmsResponse) -> Result<Vec<u8>, IpcError> {
    let mut payload = response.status.to_be_bytes().to_vec();
    if let Some(element) = &response.element {
        payload.extend_from_slice(&serde_json::to_vec(element)?);
    }
    Ok(payload)
}

/// Decodes a reply payload.
///
/// # Errors
///
/// Returns a codec error for truncated or malformed payloads.
pub fn decode_response(payload: &[u8]) -> Result<AmsResponse, IpcError> {
    if payload.len() < 4 {
        return Err(IpcError::Malformed("response shorter than status"));
    }
    let status = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let element = if payload.len() > 4 {
        Some(serde_json::from_slice(&payload[4..])?)
    } else {
        None
    };
    Ok(AmsResponse { status, element })
}

/// Writes one length-prefixed frame.
///
/// # Errors
///
/// Returns [`IpcError::FrameTooLarge`] before writing anything, or the
/// underlying I/O error.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), IpcError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_SIZE {
        return Err(IpcError::FrameTooLarge {
            size: payload.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    #[allow(clippy::cast_possible_truncation)] // bounded by MAX_FRAME_SIZE
    let len = payload.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed frame.
///
/// The size is validated before allocation. Returns `Ok(None)` on a clean
/// end of stream at a frame boundary.
///
/// # Errors
///
/// Returns [`IpcError::FrameTooLarge`] for oversized declarations,
/// [`IpcError::ConnectionClosed`] for mid-frame closes, or the underlying
/// I/O error.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, IpcError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {},
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(IpcError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => IpcError::ConnectionClosed,
            _ => IpcError::Io(e),
        })?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::want::ElementName;

    #[test]
    fn test_transaction_value_packing() {
        let value = pack_transaction_value(0x12, LifecycleState::Background);
        assert_eq!(value, 0x0412);

        let (token, state) = unpack_transaction_value(value);
        assert_eq!(token, 0x12);
        assert_eq!(state, Some(LifecycleState::Background));

        // Token packing is single-byte by contract.
        let value = pack_transaction_value(0x1FF, LifecycleState::Active);
        let (token, _) = unpack_transaction_value(value);
        assert_eq!(token, 0xFF);
    }

    #[test]
    fn test_token_value_packing() {
        assert_eq!(pack_token_value(0xBEEF), 0xBEEF);
        assert_eq!(unpack_token_value(0xAA_BEEF), 0xBEEF);
    }

    #[test]
    fn test_start_ability_record_layout() {
        let want = Want::new(ElementName::new("com.example.music", "Main"));
        let record = encode_request(&AmsRequest::StartAbility { want: want.clone() }).unwrap();

        assert_eq!(record[0], MsgId::StartAbility as u8);
        assert_eq!(&record[1..5], &[0, 0, 0, 0]); // msgValue unused
        let len = u16::from_be_bytes([record[5], record[6]]) as usize;
        assert_eq!(len, record.len() - 7);

        match decode_request(&record).unwrap() {
            AmsRequest::StartAbility { want: decoded } => assert_eq!(decoded, want),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_terminate_and_done_decode() {
        let record = encode_request(&AmsRequest::TerminateAbility { token: 513 }).unwrap();
        assert_eq!(
            decode_request(&record).unwrap(),
            AmsRequest::TerminateAbility { token: 513 }
        );

        let record = encode_request(&AmsRequest::LifecycleDone {
            token: 7,
            state: LifecycleState::Active,
        })
        .unwrap();
        assert_eq!(
            decode_request(&record).unwrap(),
            AmsRequest::LifecycleDone {
                token: 7,
                state: LifecycleState::Active,
            }
        );
    }

    #[test]
    fn test_force_stop_bundle_carries_name() {
        let record = encode_request(&AmsRequest::ForceStopBundle {
            bundle_name: "com.example.music".into(),
        })
        .unwrap();
        match decode_request(&record).unwrap() {
            AmsRequest::ForceStopBundle { bundle_name } => {
                assert_eq!(bundle_name, "com.example.music");
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_request(&[0, 1]),
            Err(IpcError::Malformed(_))
        ));
        assert!(matches!(
            decode_request(&[99, 0, 0, 0, 0, 0, 0]),
            Err(IpcError::UnknownMessage(99))
        ));
        // Header claims one data byte, none present.
        assert!(matches!(
            decode_request(&[1, 0, 0, 0, 0, 0, 1]),
            Err(IpcError::Malformed(_))
        ));
    }

    #[test]
    fn test_response_payload() {
        let response = AmsResponse {
            status: 0,
            element: Some(ElementName::new("launcher", "")),
        };
        let payload = encode_response(&response).unwrap();
        assert_eq!(decode_response(&payload).unwrap(), response);

        let payload = encode_response(&AmsResponse::error(-1)).unwrap();
        let decoded = decode_response(&payload).unwrap();
        assert_eq!(decoded.status, -1);
        assert!(decoded.element.is_none());
    }

    #[tokio::test]
    async fn test_frame_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        write_frame(&mut client, b"hello").await.unwrap();
        let frame = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(frame, b"hello");

        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let mut header = Vec::new();
        #[allow(clippy::cast_possible_truncation)]
        header.extend_from_slice(&((MAX_FRAME_SIZE + 1) as u32).to_be_bytes());
        tokio::io::AsyncWriteExt::write_all(&mut client, &header)
            .await
            .unwrap();

        assert!(matches!(
            read_frame(&mut server).await,
            Err(IpcError::FrameTooLarge { .. })
        ));
    }
}
