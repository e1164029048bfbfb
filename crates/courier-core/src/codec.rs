use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TransportResult;

/// Pluggable body serializer.
///
/// Producers encode typed bodies with it; registered handlers decode with
/// it. The same codec used to publish must be used to receive — the envelope
/// carries no codec tag. Decode failures are unretryable by definition:
/// retrying cannot fix a corrupt payload.
pub trait BodyCodec: Clone + Send + Sync + 'static {
    fn to_bytes<T: Serialize>(&self, value: &T) -> TransportResult<Vec<u8>>;

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> TransportResult<T>;
}

/// JSON body codec, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl BodyCodec for JsonCodec {
    fn to_bytes<T: Serialize>(&self, value: &T) -> TransportResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn from_bytes<T: DeserializeOwned>(&self, bytes: &[u8]) -> TransportResult<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
