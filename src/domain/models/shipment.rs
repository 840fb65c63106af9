use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Shipment lifecycle vocabulary. Strict forward progression with a
/// RETURNED side-branch; DELIVERED and RETURNED are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Received,
    InTransit,
    OutForDelivery,
    Delivered,
    Returned,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Received => "RECEIVED",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Returned => "RETURNED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Returned)
    }

    pub fn successors(&self) -> &'static [ShipmentStatus] {
        match self {
            ShipmentStatus::Received => {
                &[ShipmentStatus::InTransit, ShipmentStatus::Returned]
            }
            ShipmentStatus::InTransit => {
                &[ShipmentStatus::OutForDelivery, ShipmentStatus::Returned]
            }
            ShipmentStatus::OutForDelivery => {
                &[ShipmentStatus::Delivered, ShipmentStatus::Returned]
            }
            ShipmentStatus::Delivered | ShipmentStatus::Returned => &[],
        }
    }

    pub fn can_transition_to(&self, next: ShipmentStatus) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact block on a shipment. Sender/recipient are not necessarily
/// registered users; the email is what the ownership predicate matches on.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Contact {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

/// Creation payload for the ledger.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewShipment {
    pub sender: Contact,
    pub recipient: Contact,
    pub weight_kg: f64,
    pub declared_value: f64,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Shipment {
    pub id: String,
    pub tenant_id: String,
    pub tracking_code: String,
    pub sender_name: String,
    pub sender_address: String,
    pub sender_phone: String,
    pub sender_email: String,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_phone: String,
    pub recipient_email: String,
    pub weight_kg: f64,
    pub declared_value: f64,
    pub description: String,
    pub current_status: ShipmentStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Shipment {
    pub fn new(tenant_id: String, tracking_code: String, payload: NewShipment) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tenant_id,
            tracking_code,
            sender_name: payload.sender.name,
            sender_address: payload.sender.address,
            sender_phone: payload.sender.phone,
            sender_email: payload.sender.email,
            recipient_name: payload.recipient.name,
            recipient_address: payload.recipient.address,
            recipient_phone: payload.recipient.phone,
            recipient_email: payload.recipient.email,
            weight_kg: payload.weight_kg,
            declared_value: payload.declared_value,
            description: payload.description,
            current_status: ShipmentStatus::Received,
            version: 1,
            created_at: Utc::now(),
        }
    }
}

/// Append-only audit record. Never updated or deleted; `seq` is the shipment
/// version that produced the entry, so ordering is creation order with ties
/// impossible.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct HistoryEntry {
    pub id: String,
    pub shipment_id: String,
    pub status: ShipmentStatus,
    pub comment: Option<String>,
    pub actor_id: String,
    pub seq: i64,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        shipment_id: String,
        status: ShipmentStatus,
        comment: Option<String>,
        actor_id: String,
        seq: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            shipment_id,
            status,
            comment,
            actor_id,
            seq,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_progression_is_strict() {
        assert!(ShipmentStatus::Received.can_transition_to(ShipmentStatus::InTransit));
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::Delivered));

        assert!(!ShipmentStatus::Received.can_transition_to(ShipmentStatus::Delivered));
        assert!(!ShipmentStatus::Received.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(!ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::Received));
    }

    #[test]
    fn returned_reachable_from_any_non_terminal() {
        assert!(ShipmentStatus::Received.can_transition_to(ShipmentStatus::Returned));
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::Returned));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::Returned));
    }

    #[test]
    fn terminal_states_have_no_successors() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());
        assert!(ShipmentStatus::Delivered.successors().is_empty());
        assert!(ShipmentStatus::Returned.successors().is_empty());
        assert!(!ShipmentStatus::Returned.can_transition_to(ShipmentStatus::Received));
    }
}
