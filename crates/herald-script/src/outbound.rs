//! The outbound-message collaborator.
//!
//! Capability functions that deliver messages are fire-and-forget from the
//! render pipeline's perspective: failures are logged by the caller, never
//! surfaced as script errors, and never block rendering.

use thiserror::Error;

use herald_core::{ChannelId, UserId};

/// Delivery failure from the outbound collaborator.
#[derive(Debug, Error)]
pub enum OutboundError {
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Delivers text to a user or a channel.
///
/// Implementations are expected to be cheap to call from the render path;
/// anything slow should queue internally.
pub trait Outbound: Send + Sync {
    /// Deliver a direct message to a user.
    fn deliver_dm(&self, user: UserId, text: &str) -> Result<(), OutboundError>;

    /// Deliver a message to a channel.
    fn deliver_channel(&self, channel: ChannelId, text: &str) -> Result<(), OutboundError>;
}

/// An outbound sink that drops everything. Useful in tests and for
/// contexts rendered outside a live connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutbound;

impl Outbound for NullOutbound {
    fn deliver_dm(&self, _user: UserId, _text: &str) -> Result<(), OutboundError> {
        Ok(())
    }

    fn deliver_channel(&self, _channel: ChannelId, _text: &str) -> Result<(), OutboundError> {
        Ok(())
    }
}
