use crate::domain::models::shipment::{HistoryEntry, Shipment, ShipmentStatus};
use crate::domain::ports::ShipmentRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresShipmentRepo {
    pool: PgPool,
}

impl PostgresShipmentRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShipmentRepository for PostgresShipmentRepo {
    async fn create_with_history(
        &self,
        shipment: &Shipment,
        entry: &HistoryEntry,
    ) -> Result<Shipment, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let created = sqlx::query_as::<_, Shipment>(
            "INSERT INTO shipments (id, tenant_id, tracking_code, sender_name, sender_address, sender_phone, sender_email, recipient_name, recipient_address, recipient_phone, recipient_email, weight_kg, declared_value, description, current_status, version, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             RETURNING *",
        )
            .bind(&shipment.id)
            .bind(&shipment.tenant_id)
            .bind(&shipment.tracking_code)
            .bind(&shipment.sender_name)
            .bind(&shipment.sender_address)
            .bind(&shipment.sender_phone)
            .bind(&shipment.sender_email)
            .bind(&shipment.recipient_name)
            .bind(&shipment.recipient_address)
            .bind(&shipment.recipient_phone)
            .bind(&shipment.recipient_email)
            .bind(shipment.weight_kg)
            .bind(shipment.declared_value)
            .bind(&shipment.description)
            .bind(shipment.current_status)
            .bind(shipment.version)
            .bind(shipment.created_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO history_entries (id, shipment_id, status, comment, actor_id, seq, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
            .bind(&entry.id)
            .bind(&entry.shipment_id)
            .bind(entry.status)
            .bind(&entry.comment)
            .bind(&entry.actor_id)
            .bind(entry.seq)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(
        &self,
        tenant_id: &str,
        id: &str,
    ) -> Result<Option<Shipment>, AppError> {
        sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE tenant_id = $1 AND id = $2",
        )
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_tracking_code(&self, code: &str) -> Result<Option<Shipment>, AppError> {
        sqlx::query_as::<_, Shipment>("SELECT * FROM shipments WHERE tracking_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_tenant(&self, tenant_id: &str) -> Result<Vec<Shipment>, AppError> {
        sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn append_transition(
        &self,
        tenant_id: &str,
        shipment_id: &str,
        expected_version: i64,
        new_status: ShipmentStatus,
        entry: &HistoryEntry,
    ) -> Result<Shipment, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let updated = sqlx::query_as::<_, Shipment>(
            "UPDATE shipments SET current_status = $1, version = version + 1
             WHERE id = $2 AND tenant_id = $3 AND version = $4
             RETURNING *",
        )
            .bind(new_status)
            .bind(shipment_id)
            .bind(tenant_id)
            .bind(expected_version)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(updated) = updated else {
            return Err(AppError::Conflict(
                "Shipment was modified concurrently".to_string(),
            ));
        };

        sqlx::query(
            "INSERT INTO history_entries (id, shipment_id, status, comment, actor_id, seq, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
            .bind(&entry.id)
            .bind(&entry.shipment_id)
            .bind(entry.status)
            .bind(&entry.comment)
            .bind(&entry.actor_id)
            .bind(entry.seq)
            .bind(entry.created_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }

    async fn list_history(&self, shipment_id: &str) -> Result<Vec<HistoryEntry>, AppError> {
        sqlx::query_as::<_, HistoryEntry>(
            "SELECT * FROM history_entries WHERE shipment_id = $1 ORDER BY seq ASC",
        )
            .bind(shipment_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
