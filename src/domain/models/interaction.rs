//! Append-only log of calls that touched a carrier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a call did to the carrier record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Created,
    Updated,
    /// Phone matched this carrier but the MC numbers disagree; nothing merged.
    Conflict,
}

impl InteractionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Conflict => "conflict",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "conflict" => Some(Self::Conflict),
            _ => None,
        }
    }
}

/// One call-to-carrier interaction.
///
/// `(call_id, carrier_id)` is unique, so replaying a call does not append twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierCallInteraction {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub carrier_id: Uuid,
    pub call_id: Uuid,
    pub load_id: Option<Uuid>,
    pub kind: InteractionKind,
    pub confidence: u8,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}
