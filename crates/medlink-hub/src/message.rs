//! Change notification pushed to connected clients.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A transient "something changed" message.
///
/// Produced once per successfully-cached update, broadcast to every client
/// registered at that moment, then discarded. Never persisted or replayed.
/// The field names are the wire shape: each notification is sent as one
/// JSON object per outbound push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short human-readable title.
    pub header: String,
    /// Message body.
    pub text: String,
    /// Numeric update-kind discriminator.
    pub type_id: u32,
    /// Kind of the referenced entity ("receptions", "patientlist", "medcard").
    pub reference: String,
    /// Identifier of the referenced entity (0 for whole-collection updates).
    pub reference_id: u64,
    /// Unique id of this broadcast.
    pub broadcast_uuid: Uuid,
}

impl Notification {
    /// Create a notification with a fresh broadcast id.
    pub fn new(
        header: impl Into<String>,
        text: impl Into<String>,
        type_id: u32,
        reference: impl Into<String>,
        reference_id: u64,
    ) -> Self {
        Self {
            header: header.into(),
            text: text.into(),
            type_id,
            reference: reference.into(),
            reference_id,
            broadcast_uuid: Uuid::new_v4(),
        }
    }
}
