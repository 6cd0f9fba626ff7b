//! Presence events emitted toward downstream command handling.

use herald_core::GuildId;

/// A change in guild membership observed by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceEvent {
    /// The guild was left, either live or while the process was offline.
    ///
    /// Synthetic removals from a reconciliation pass and real gateway
    /// delete notifications both surface through this variant so
    /// downstream cleanup handles them the same way.
    GuildRemoved(GuildId),
}
