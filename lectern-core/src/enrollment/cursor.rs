use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::{AuthoringError, Result};

/// Opaque keyset-pagination token: the `(updated_at, id)` position of
/// the last item on the previous page.
///
/// Encoded as base64 over `millis:uuid` so clients can hold it without
/// caring about its contents. Garbage tokens are `InvalidInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub updated_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.updated_at.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw)
    }

    pub fn decode(token: &str) -> Result<Self> {
        let bad =
            || AuthoringError::InvalidInput("malformed pagination cursor".into());

        let raw = URL_SAFE_NO_PAD.decode(token).map_err(|_| bad())?;
        let raw = String::from_utf8(raw).map_err(|_| bad())?;
        let (millis, id) = raw.split_once(':').ok_or_else(bad)?;

        let millis: i64 = millis.parse().map_err(|_| bad())?;
        let updated_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(bad)?;
        let id: Uuid = id.parse().map_err(|_| bad())?;

        Ok(Cursor { updated_at, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let cursor = Cursor {
            updated_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            id: Uuid::now_v7(),
        };
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn garbage_tokens_are_invalid_input() {
        for token in ["", "!!!", "bm90LWEtY3Vyc29y", "MTIzNA"] {
            let err = Cursor::decode(token).unwrap_err();
            assert!(matches!(err, AuthoringError::InvalidInput(_)));
        }
    }
}
