//! # Herald
//!
//! The unified API for the Herald runtime - guild sharding, permission
//! resolution, presence reconciliation, and sandboxed scripted commands.
//!
//! ## Overview
//!
//! Herald provides the core runtime services of a multi-shard chat bot:
//!
//! - **Sharding**: deterministic guild-to-shard partitioning
//! - **Permissions**: effective permission resolution from guild snapshots
//! - **Presence**: a durable guild set reconciled against live shard views
//! - **Scripting**: sandboxed per-invocation script execution with
//!   capability caps and output sanitizing
//!
//! ## Key Concepts
//!
//! - **Durable guild set**: survives restarts; reconciliation detects
//!   guilds left while the process was offline.
//! - **Partition ownership**: each shard reconciles only its own slice of
//!   the guild space, so passes never contend.
//! - **Script context**: one invocation, one context; capability functions
//!   are bound at construction from a closed provider set.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use herald::{Runtime, RuntimeConfig};
//! use herald::core::{BotUser, UserId};
//! use herald::store::MemoryStore;
//!
//! async fn example() {
//!     let bot = BotUser {
//!         id: UserId::new(1),
//!         username: "herald".into(),
//!     };
//!
//!     let runtime = Runtime::new(
//!         bot,
//!         MemoryStore::new(),
//!         MemoryStore::new(),
//!         RuntimeConfig::default(),
//!     );
//!
//!     let connected = runtime.load_connected_guilds().await.unwrap();
//!     println!("connected to {} guilds", connected.len());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `herald::core` - Pure primitives (ids, entities, permissions, sharding)
//! - `herald::store` - Storage abstraction, memory and SQLite backends
//! - `herald::presence` - Guild set reconciliation
//! - `herald::script` - Sandboxed script execution

pub mod error;
pub mod runtime;

// Re-export component crates
pub use herald_core as core;
pub use herald_presence as presence;
pub use herald_script as script;
pub use herald_store as store;

// Re-export main types for convenience
pub use error::{Result, RuntimeError};
pub use runtime::{Runtime, RuntimeConfig};

// Re-export commonly used core types
pub use herald_core::{
    BotUser, Channel, ChannelId, Guild, GuildId, Member, Permissions, Role, RoleId, UserId,
};
