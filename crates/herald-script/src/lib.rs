//! # Herald Script
//!
//! Executes one untrusted, user-authored script per command invocation and
//! produces a safe output string.
//!
//! A [`ScriptContext`] binds guild/channel/member snapshots and a closed
//! set of bounded capability functions into a Lua engine, runs the script,
//! and passes the rendered output through a mention-escaping filter. The
//! capability surface degrades silently when abused (call caps, duplicate
//! DMs) - untrusted scripts must never crash the host through resource
//! exhaustion.
//!
//! ## Lifecycle
//!
//! ```text
//! ScriptContextBuilder::new(bot, guild, channel, member)
//!     -> providers bind capability functions
//!     -> entity data bound as read globals (with legacy aliases)
//!     -> render(source): parse, execute, sanitize
//! ```
//!
//! A context serves exactly one invocation and is strictly single-threaded;
//! it is never reused or shared across executions.

pub mod caps;
pub mod context;
pub mod error;
pub mod outbound;
pub mod sanitize;

pub use caps::{BaseCapabilities, BindingCtx, CapabilityProvider};
pub use context::{ScriptContext, ScriptContextBuilder};
pub use error::{Result, ScriptError};
pub use outbound::{NullOutbound, Outbound, OutboundError};
pub use sanitize::escape_mentions;
