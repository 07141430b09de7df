//! View id generation
//!
//! Engine-side view state is keyed by these ids for the lifetime of the
//! engine module, so they must never repeat.

use uuid::Uuid;

/// New panel id, unique per process
pub fn generate_panel_id() -> String {
    format!("panel-{}", Uuid::new_v4().simple())
}

/// View id for a panel showing a document
pub fn generate_view_id(document_id: &str, panel_id: &str) -> String {
    format!("{}-{}", document_id, panel_id)
}
