use crate::domain::models::auth::Actor;
use crate::domain::models::membership::Role;
use crate::domain::models::shipment::{HistoryEntry, NewShipment, Shipment, ShipmentStatus};
use crate::domain::ports::ShipmentRepository;
use crate::domain::services::access::{can, Action, Resource};
use crate::domain::services::notifier::NotificationDispatcher;
use crate::error::{is_unique_violation, AppError};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

// No ambiguous 0/O/1/I characters; codes end up on printed labels.
const TRACKING_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const TRACKING_CODE_LEN: usize = 12;

/// Public, unauthenticated view of a shipment's progress. Exposes no contact
/// or tenant data.
#[derive(Debug, Serialize)]
pub struct TrackingView {
    pub tracking_code: String,
    pub current_status: ShipmentStatus,
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Serialize)]
pub struct TrackingEvent {
    pub status: ShipmentStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Owns shipment records and the append-only transition history. All writes
/// are gated by the capability matrix; sender/recipient reads additionally
/// pass the ownership predicate.
pub struct ShipmentLedger {
    repo: Arc<dyn ShipmentRepository>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl ShipmentLedger {
    pub fn new(repo: Arc<dyn ShipmentRepository>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { repo, dispatcher }
    }

    pub async fn create(&self, actor: &Actor, payload: NewShipment) -> Result<Shipment, AppError> {
        if !can(actor.role, Action::Create, Resource::Shipments) {
            return Err(AppError::Forbidden(
                "Not allowed to create shipments".to_string(),
            ));
        }
        if payload.weight_kg <= 0.0 {
            return Err(AppError::Validation("Weight must be positive".to_string()));
        }
        if payload.declared_value < 0.0 {
            return Err(AppError::Validation(
                "Declared value must not be negative".to_string(),
            ));
        }

        let tracking_code = generate_tracking_code();
        let shipment = Shipment::new(actor.tenant_id.clone(), tracking_code, payload);
        let entry = HistoryEntry::new(
            shipment.id.clone(),
            ShipmentStatus::Received,
            None,
            actor.user_id.clone(),
            1,
        );

        let created = self
            .repo
            .create_with_history(&shipment, &entry)
            .await
            .map_err(|e| match e {
                AppError::Database(db) if is_unique_violation(&db) => {
                    AppError::Conflict("Tracking code collision".to_string())
                }
                other => other,
            })?;

        info!(
            "Created shipment {} ({}) in tenant {}",
            created.id, created.tracking_code, created.tenant_id
        );
        Ok(created)
    }

    pub async fn get(&self, actor: &Actor, shipment_id: &str) -> Result<Shipment, AppError> {
        if !can(actor.role, Action::View, Resource::Shipments) {
            return Err(AppError::Forbidden(
                "Not allowed to view shipments".to_string(),
            ));
        }
        let shipment = self
            .repo
            .find_by_id(&actor.tenant_id, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        // A shipment the caller is not party to is reported as missing, not
        // forbidden: its existence is none of their business.
        if !is_party(&shipment, actor) {
            return Err(AppError::NotFound("Shipment not found".to_string()));
        }
        Ok(shipment)
    }

    pub async fn list(&self, actor: &Actor) -> Result<Vec<Shipment>, AppError> {
        if !can(actor.role, Action::View, Resource::Shipments) {
            return Err(AppError::Forbidden(
                "Not allowed to view shipments".to_string(),
            ));
        }
        let shipments = self.repo.list_by_tenant(&actor.tenant_id).await?;
        Ok(shipments
            .into_iter()
            .filter(|s| is_party(s, actor))
            .collect())
    }

    pub async fn history(
        &self,
        actor: &Actor,
        shipment_id: &str,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        if !can(actor.role, Action::View, Resource::History) {
            return Err(AppError::Forbidden(
                "Not allowed to view history".to_string(),
            ));
        }
        // Same visibility rules as `get`; a hidden shipment hides its history.
        let shipment = self.get(actor, shipment_id).await?;
        self.repo.list_history(&shipment.id).await
    }

    /// The state-machine core. Appends the history entry and moves
    /// `current_status` in one transaction, serialized per shipment by a
    /// version compare-and-swap; losers of a race get `Conflict`.
    pub async fn transition(
        &self,
        actor: &Actor,
        shipment_id: &str,
        new_status: ShipmentStatus,
        comment: Option<String>,
    ) -> Result<HistoryEntry, AppError> {
        if !can(actor.role, Action::Update, Resource::Shipments) {
            return Err(AppError::Forbidden(
                "Not allowed to update shipments".to_string(),
            ));
        }
        let shipment = self
            .repo
            .find_by_id(&actor.tenant_id, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Shipment not found".to_string()))?;

        let old_status = shipment.current_status;
        if !old_status.can_transition_to(new_status) {
            return Err(AppError::IllegalTransition {
                from: old_status,
                to: new_status,
            });
        }

        let entry = HistoryEntry::new(
            shipment.id.clone(),
            new_status,
            comment,
            actor.user_id.clone(),
            shipment.version + 1,
        );

        let updated = self
            .repo
            .append_transition(
                &actor.tenant_id,
                shipment_id,
                shipment.version,
                new_status,
                &entry,
            )
            .await?;

        info!(
            "Shipment {} transitioned {} -> {}",
            updated.tracking_code, old_status, new_status
        );

        // Fire-and-forget relative to the commit: the transition already
        // succeeded, and a disconnecting caller must not cancel the sends.
        let dispatcher = self.dispatcher.clone();
        let entry_comment = entry.comment.clone();
        tokio::spawn(async move {
            let report = dispatcher
                .dispatch(&updated, old_status, new_status, entry_comment.as_deref())
                .await;
            if report.nothing_sent() {
                warn!(
                    "No status notification sent for {}: {:?}",
                    updated.tracking_code, report.skipped
                );
            }
        });

        Ok(entry)
    }

    /// Public tracking lookup by globally unique code. No authentication and
    /// no tenant context required.
    pub async fn track(&self, tracking_code: &str) -> Result<TrackingView, AppError> {
        let shipment = self
            .repo
            .find_by_tracking_code(tracking_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Tracking code not found".to_string()))?;

        let history = self.repo.list_history(&shipment.id).await?;
        Ok(TrackingView {
            tracking_code: shipment.tracking_code,
            current_status: shipment.current_status,
            events: history
                .into_iter()
                .map(|e| TrackingEvent {
                    status: e.status,
                    occurred_at: e.created_at,
                })
                .collect(),
        })
    }
}

/// Row-level ownership predicate for customer roles. Operators and above see
/// every shipment in their tenant.
fn is_party(shipment: &Shipment, actor: &Actor) -> bool {
    match actor.role {
        Role::Sender => shipment.sender_email.eq_ignore_ascii_case(&actor.email),
        Role::Recipient => shipment.recipient_email.eq_ignore_ascii_case(&actor.email),
        _ => true,
    }
}

fn generate_tracking_code() -> String {
    let mut rng = rand::thread_rng();
    let body: String = (0..TRACKING_CODE_LEN)
        .map(|_| TRACKING_ALPHABET[rng.gen_range(0..TRACKING_ALPHABET.len())] as char)
        .collect();
    format!("TRK-{}", body)
}
