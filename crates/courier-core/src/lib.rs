pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod policy;
pub mod queue;
pub mod registry;
pub mod service;
pub mod telemetry;
pub mod transport;

pub use codec::{BodyCodec, JsonCodec};
pub use config::ServiceConfig;
pub use error::{HandlerError, ServiceError, TransportError, TransportResult};
pub use message::{Message, MessageError};
pub use policy::{decide, Decision, ErrorKind};
pub use queue::{short_type_name, QueueNames};
pub use registry::HandlerRegistry;
pub use service::{MessageService, ServiceStats, StatsSnapshot};
pub use transport::{
    InMemoryMessageFactory, MessageFactory, MessageProducer, MessageQueueClient,
    RedisMessageFactory,
};
