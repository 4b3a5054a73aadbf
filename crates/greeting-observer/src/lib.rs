//! Observer server for the greeting widget.
//!
//! Renders the greeting display slot for browsers:
//!
//! - **Greeting page** (`GET /`) with the slot element and a script that
//!   follows live updates
//! - **`WebSocket` endpoint** (`/ws/greeting`) streaming every slot
//!   mutation via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the current snapshot and liveness
//!
//! The updater writes to a [`BroadcastSlot`]; the observer only reads it.
//!
//! [`BroadcastSlot`]: state::BroadcastSlot

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerConfig, ServerError, bind, serve};
pub use startup::{ObserverHandle, StartupError, spawn_observer};
pub use state::{AppState, BroadcastSlot};
