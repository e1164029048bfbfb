use crate::message::MessageError;
use crate::policy::ErrorKind;

/// Transport-level failures (broker connection, envelope serialization).
/// This is the error type for the `MessageQueueClient` trait — transport
/// operations can only fail with infrastructure errors, never domain errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for TransportError {
    fn from(err: redis::RedisError) -> Self {
        TransportError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Serialization(err.to_string())
    }
}

/// Failure classification returned by message handlers.
///
/// The worker pool maps `Transient` onto the retry path (bounded by the
/// type's retry limit) and `Unretryable` straight onto the dead-letter
/// queue. Anything a handler cannot classify should be `Transient`.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("transient failure: {0}")]
    Transient(String),

    #[error("unretryable failure: {0}")]
    Unretryable(String),
}

impl HandlerError {
    pub fn transient(message: impl Into<String>) -> Self {
        HandlerError::Transient(message.into())
    }

    pub fn unretryable(message: impl Into<String>) -> Self {
        HandlerError::Unretryable(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HandlerError::Transient(_) => ErrorKind::Transient,
            HandlerError::Unretryable(_) => ErrorKind::Unretryable,
        }
    }
}

impl From<&HandlerError> for MessageError {
    fn from(err: &HandlerError) -> Self {
        let code = match err {
            HandlerError::Transient(_) => "Transient",
            HandlerError::Unretryable(_) => "Unretryable",
        };
        MessageError {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// Lifecycle and registration errors for the message service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service already started")]
    AlreadyStarted,

    #[error("handler already registered for type: {0}")]
    HandlerAlreadyRegistered(String),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_kinds() {
        assert_eq!(
            HandlerError::transient("busy").kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            HandlerError::unretryable("bad payload").kind(),
            ErrorKind::Unretryable
        );
    }

    #[test]
    fn message_error_carries_classification_code() {
        let err = HandlerError::unretryable("bad payload");
        let recorded = MessageError::from(&err);
        assert_eq!(recorded.code, "Unretryable");
        assert!(recorded.message.contains("bad payload"));
    }

    #[test]
    fn serde_json_errors_map_to_serialization() {
        let err = serde_json::from_slice::<String>(b"not-json").unwrap_err();
        match TransportError::from(err) {
            TransportError::Serialization(_) => {}
            other => panic!("expected Serialization, got {other:?}"),
        }
    }
}
