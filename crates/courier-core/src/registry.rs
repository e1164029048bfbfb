use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::BodyCodec;
use crate::error::{HandlerError, ServiceError, ServiceResult};
use crate::message::Message;
use crate::queue::{short_type_name, QueueNames};

/// Erased handler invocation: decode the body, run the typed handler,
/// encode the response. Built once at registration time — dispatch is a
/// plain map lookup, no runtime reflection.
pub(crate) type HandlerFn =
    Box<dyn Fn(&Message) -> Result<Option<Vec<u8>>, HandlerError> + Send + Sync>;

/// One registered message type: its processing closure and worker policy.
pub(crate) struct HandlerEntry {
    pub(crate) type_name: String,
    pub(crate) response_type_name: String,
    pub(crate) queues: QueueNames,
    pub(crate) handler: HandlerFn,
    pub(crate) workers: usize,
    /// Overrides the service-wide retry limit when set.
    pub(crate) retry_limit: Option<u32>,
}

/// Maps a logical message type to its processing function and worker-count
/// policy. Populated before the service starts and immutable afterwards —
/// the worker pool reads it only during startup.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: HashMap<String, Arc<HandlerEntry>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed handler.
    ///
    /// The handler receives the envelope (as context) and the decoded body,
    /// and returns an optional response: `Some` is published as a reply,
    /// `None` means one-way. `workers` is the concurrent slot count for the
    /// type; `retry_limit` overrides the service-wide limit when set.
    pub fn register<Req, Res, F, C>(
        &mut self,
        workers: usize,
        retry_limit: Option<u32>,
        codec: C,
        handler: F,
    ) -> ServiceResult<()>
    where
        Req: DeserializeOwned + Send + 'static,
        Res: Serialize + Send + 'static,
        F: Fn(&Message, Req) -> Result<Option<Res>, HandlerError> + Send + Sync + 'static,
        C: BodyCodec,
    {
        let type_name = short_type_name::<Req>().to_string();
        if self.entries.contains_key(&type_name) {
            return Err(ServiceError::HandlerAlreadyRegistered(type_name));
        }

        let erased: HandlerFn = Box::new(move |message: &Message| {
            // A body the codec cannot decode is poison — retrying cannot fix it
            let body: Req = codec
                .from_bytes(&message.body)
                .map_err(|e| HandlerError::unretryable(format!("body decode failed: {e}")))?;
            match handler(message, body)? {
                Some(response) => {
                    let bytes = codec.to_bytes(&response).map_err(|e| {
                        HandlerError::unretryable(format!("response encode failed: {e}"))
                    })?;
                    Ok(Some(bytes))
                }
                None => Ok(None),
            }
        });

        let entry = HandlerEntry {
            type_name: type_name.clone(),
            response_type_name: short_type_name::<Res>().to_string(),
            queues: QueueNames::new(type_name.as_str()),
            handler: erased,
            workers: workers.max(1),
            retry_limit,
        };
        self.entries.insert(type_name, Arc::new(entry));
        Ok(())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &Arc<HandlerEntry>> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Incr {
        value: i64,
    }

    fn incr_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register(1, None, JsonCodec, |_msg: &Message, body: Incr| {
                Ok(Some(Incr {
                    value: body.value + 1,
                }))
            })
            .unwrap();
        registry
    }

    #[test]
    fn registration_is_keyed_by_short_type_name() {
        let registry = incr_registry();
        assert!(registry.contains("Incr"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = incr_registry();
        let err = registry
            .register(1, None, JsonCodec, |_msg: &Message, body: Incr| {
                Ok(Some(body))
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::HandlerAlreadyRegistered(name) if name == "Incr"
        ));
    }

    #[test]
    fn erased_handler_round_trips_the_body() {
        let registry = incr_registry();
        let entry = registry.entries().next().unwrap();

        let message = Message::new("Incr", serde_json::to_vec(&Incr { value: 41 }).unwrap());
        let response = (entry.handler)(&message).unwrap().expect("response bytes");
        let decoded: Incr = serde_json::from_slice(&response).unwrap();
        assert_eq!(decoded.value, 42);
    }

    #[test]
    fn undecodable_body_is_unretryable() {
        let registry = incr_registry();
        let entry = registry.entries().next().unwrap();

        let message = Message::new("Incr", b"garbage".to_vec());
        let err = (entry.handler)(&message).unwrap_err();
        assert!(matches!(err, HandlerError::Unretryable(_)));
    }

    #[test]
    fn one_way_handlers_return_no_bytes() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(1, None, JsonCodec, |_msg: &Message, _body: Incr| {
                Ok(None::<Incr>)
            })
            .unwrap();
        let entry = registry.entries().next().unwrap();

        let message = Message::new("Incr", serde_json::to_vec(&Incr { value: 0 }).unwrap());
        assert!((entry.handler)(&message).unwrap().is_none());
    }

    #[test]
    fn worker_count_floors_at_one() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(0, Some(5), JsonCodec, |_msg: &Message, body: Incr| {
                Ok(Some(body))
            })
            .unwrap();
        let entry = registry.entries().next().unwrap();
        assert_eq!(entry.workers, 1);
        assert_eq!(entry.retry_limit, Some(5));
    }
}
