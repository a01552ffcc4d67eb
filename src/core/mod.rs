//! # Core Engine Logic
//!
//! This module contains the action engine. It knows nothing about how the
//! portal is reached (that's behind [`crate::auth::AuthProvider`]) or how
//! the results are shown (observers subscribe to the notification bus).
//!
//! ```text
//!     ┌──────────┐   ┌──────────┐
//!     │    UI    │   │  Ticker  │        producers
//!     └────┬─────┘   └────┬─────┘
//!          └──── enqueue ─┘
//!                 ▼
//!          ┌─────────────┐
//!          │ ActionQueue │               FIFO, no dedup
//!          └──────┬──────┘
//!                 ▼
//!          ┌─────────────┐   gate    ┌──────────────┐
//!          │ Dispatcher  │ ────────▶ │ AuthProvider │
//!          └──────┬──────┘           └──────────────┘
//!                 ▼
//!          ┌─────────────┐  publish  ┌─────────────────┐
//!          │ StateStore  │ ────────▶ │ NotificationBus │ ──▶ observers
//!          └─────────────┘           └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`]: The `Action` enum, everything the engine can be asked to do
//! - [`state`]: The snapshot and the store guarding it
//! - [`queue`]: Ordered intake shared by producers and workers
//! - [`dispatch`]: The worker pool and the per-action handlers
//! - [`ticker`]: Periodic `Tick` injection
//! - [`notify`]: Change channels and subscriptions
//! - [`engine`]: The owned instance tying it all together
//! - [`config`]: File and env settings

pub mod action;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod notify;
pub mod queue;
pub mod state;
pub mod ticker;

pub use action::Action;
pub use engine::{Engine, EngineSettings};
pub use state::Snapshot;
