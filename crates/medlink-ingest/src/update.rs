//! Update payloads pushed by the hospital information system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized update delivered by the HIS webhook.
///
/// The upstream payload is loosely structured, so each kind keeps its own
/// identifying field and carries the rest of the body opaquely. Identifiers
/// default to 0 when absent and are rejected by ingest validation, keeping
/// the "missing identifier" case a validation error rather than a binding
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HisUpdate {
    /// Reception set for a call changed.
    Reception {
        #[serde(default)]
        call_id: u64,
        #[serde(default)]
        receptions: Value,
    },
    /// Full patient list changed.
    PatientList {
        #[serde(default)]
        patients: Value,
    },
    /// A patient's medical card changed.
    MedCard {
        #[serde(default)]
        patient_id: u64,
        #[serde(default)]
        card: Value,
    },
    /// The HIS re-authenticated a patient; cached card data is stale.
    AuthSync {
        #[serde(default)]
        patient_id: u64,
    },
}

impl HisUpdate {
    /// Numeric discriminator carried on the outbound notification.
    pub fn type_id(&self) -> u32 {
        match self {
            HisUpdate::Reception { .. } => 1,
            HisUpdate::PatientList { .. } => 2,
            HisUpdate::MedCard { .. } => 3,
            HisUpdate::AuthSync { .. } => 4,
        }
    }

    /// Reference-kind string carried on the outbound notification.
    pub fn reference(&self) -> &'static str {
        match self {
            HisUpdate::Reception { .. } => "receptions",
            HisUpdate::PatientList { .. } => "patientlist",
            HisUpdate::MedCard { .. } | HisUpdate::AuthSync { .. } => "medcard",
        }
    }

    /// Identifier of the referenced entity (0 for the whole patient list).
    pub fn reference_id(&self) -> u64 {
        match self {
            HisUpdate::Reception { call_id, .. } => *call_id,
            HisUpdate::PatientList { .. } => 0,
            HisUpdate::MedCard { patient_id, .. } | HisUpdate::AuthSync { patient_id } => {
                *patient_id
            }
        }
    }
}
