//! Intake identifiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier minted once per accepted intake. UUIDv7, so ids sort by
/// creation time and double as a rough receipt timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
pub struct IntakeId(Uuid);

impl IntakeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for IntakeId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_render_as_uuids() {
        let a = IntakeId::new();
        let b = IntakeId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn ids_round_trip_through_serde() {
        let id = IntakeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: IntakeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
