//! Transport collaborator boundary.
//!
//! The engine stops here: retry, backoff, and timeouts for network failures
//! belong to the transport implementation, not to the engine.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use herald_core::{NotificationButton, NotificationConfig, ParseMode, UserId};

/// A fully rendered message ready to cross the transport boundary.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub text: String,
    pub buttons: Vec<NotificationButton>,
    pub image: Option<String>,
    pub parse_mode: ParseMode,
}

impl OutboundMessage {
    /// Build from a notification config, with the body already rendered.
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            text: config.message.clone(),
            buttons: config.buttons.clone(),
            image: config.image.clone(),
            parse_mode: config.parse_mode,
        }
    }

    /// Same presentation, different body. Used for per-recipient rendering.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: self.buttons.clone(),
            image: self.image.clone(),
            parse_mode: self.parse_mode,
        }
    }
}

/// A single recipient's delivery failure as reported by the transport.
#[derive(Debug, Clone, Error)]
#[error("Transport send failed: {reason}")]
pub struct TransportFailure {
    pub reason: String,
}

impl TransportFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The single point where a message crosses a network boundary.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        recipient: UserId,
        message: &OutboundMessage,
    ) -> Result<(), TransportFailure>;
}

pub type DynTransport = Arc<dyn Transport>;
