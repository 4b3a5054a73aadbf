//! Greeting selection, display slot document, transition updater, and
//! refresh scheduling for the greeting widget.
//!
//! # Modules
//!
//! - [`clock`] -- Hour-of-day reading ([`HourSource`], local and fixed clocks).
//! - [`config`] -- Configuration loading from `greeting-config.yaml`.
//! - [`document`] -- Display slots, lookup by id, and the readiness event.
//! - [`scheduler`] -- Delayed and periodic tasks with cancellation handles.
//! - [`selector`] -- Hour to greeting bucket and message.
//! - [`trigger`] -- The ready-then-hourly refresh loop.
//! - [`updater`] -- The two-phase fade transition.
//!
//! [`HourSource`]: clock::HourSource

pub mod clock;
pub mod config;
pub mod document;
pub mod scheduler;
pub mod selector;
pub mod trigger;
pub mod updater;

pub use clock::{FixedClock, Hour, HourSource, LocalClock};
pub use config::WidgetConfig;
pub use document::{DisplaySlot, Document, DocumentError, MemorySlot};
pub use scheduler::{SchedulerError, TaskExit, TaskHandle};
pub use selector::{GreetingTable, bucket_for_hour, select_greeting};
pub use trigger::GreetingScheduler;
pub use updater::{GreetingUpdater, PendingReveal, TransitionReport, UpdateError};
