//! Cache key namespace.
//!
//! All externally-sourced data lives under fixed string prefixes so the
//! ingest and reconciliation paths write to the same keys.

use std::time::Duration;

/// Key holding the full patient list.
pub const PATIENT_LIST: &str = "patientlist";

/// Standard TTL applied to every cached entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Key holding a patient's medical card.
pub fn med_card(patient_id: u64) -> String {
    format!("medcard:{patient_id}")
}

/// Key holding the reception set for a call.
pub fn receptions(call_id: u64) -> String {
    format!("receptions:{call_id}")
}
