//! Shared type definitions for the greeting widget.
//!
//! Types defined here are used by the updater core, the observer server,
//! and (via `ts-rs`) the browser page that renders the greeting.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers
//! - [`enums`] -- Greeting buckets
//! - [`slot`] -- Display slot style, snapshots, and mutations

pub mod enums;
pub mod ids;
pub mod slot;

pub use enums::GreetingBucket;
pub use ids::TransitionId;
pub use slot::{MutationKind, SlotMutation, SlotSnapshot, SlotStyle, SlotUpdate};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Types with #[ts(export)] are written to `bindings/` relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::ids::TransitionId::export_all();
        let _ = crate::enums::GreetingBucket::export_all();
        let _ = crate::slot::SlotStyle::export_all();
        let _ = crate::slot::MutationKind::export_all();
        let _ = crate::slot::SlotMutation::export_all();
        let _ = crate::slot::SlotSnapshot::export_all();
        let _ = crate::slot::SlotUpdate::export_all();
    }
}
