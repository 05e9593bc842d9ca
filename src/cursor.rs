//! Opaque pagination cursor.
//!
//! Encodes the last-seen (timestamp, tie-break id) pair as url-safe base64
//! over a fixed 24-byte layout. Callers hold it as an opaque token; a decode
//! failure is a bad request, never a panic.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn new(timestamp: DateTime<Utc>, id: Uuid) -> Self {
        Cursor { timestamp, id }
    }

    pub fn encode(&self) -> String {
        let mut bytes = [0u8; 24];
        bytes[..8].copy_from_slice(&self.timestamp.timestamp_millis().to_be_bytes());
        bytes[8..].copy_from_slice(self.id.as_bytes());
        URL_SAFE_NO_PAD.encode(bytes)
    }

    pub fn decode(token: &str) -> AppResult<Self> {
        let invalid = || AppError::BadRequest("invalid cursor".into());
        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        if bytes.len() != 24 {
            return Err(invalid());
        }
        let millis = i64::from_be_bytes(bytes[..8].try_into().map_err(|_| invalid())?);
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(invalid)?;
        let id = Uuid::from_slice(&bytes[8..]).map_err(|_| invalid())?;
        Ok(Cursor { timestamp, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let cursor = Cursor::new(
            DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            Uuid::new_v4(),
        );
        let token = cursor.encode();
        assert_eq!(Cursor::decode(&token).unwrap(), cursor);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Cursor::decode("not a cursor!!"),
            Err(AppError::BadRequest(_))
        ));
        // Valid base64, wrong length.
        let short = URL_SAFE_NO_PAD.encode([1u8, 2, 3]);
        assert!(matches!(Cursor::decode(&short), Err(AppError::BadRequest(_))));
    }
}
