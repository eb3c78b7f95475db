//! Notification delivery engine: audience resolution, preference filtering,
//! batched delivery, templated sends, and the recurring scheduler loop.

pub mod audience;
pub mod batch;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod scheduler;
pub mod service;
pub mod transport;

pub use audience::AudienceResolver;
pub use batch::{DeliveryOutcome, deliver};
pub use clock::{Clock, DynClock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use directory::{DirectoryError, DynUserDirectory, UserDirectory};
pub use error::{EngineError, Result};
pub use scheduler::Scheduler;
pub use service::NotificationEngine;
pub use transport::{DynTransport, OutboundMessage, Transport, TransportFailure};
