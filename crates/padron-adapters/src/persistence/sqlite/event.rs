use async_trait::async_trait;

use padron_core::events::DomainEvent;
use padron_ports::error::PortError;
use padron_ports::outbound::EventPublisher;

use super::SqliteDb;

#[async_trait]
impl EventPublisher for SqliteDb {
    async fn publish(&self, events: Vec<DomainEvent>) -> Result<(), PortError> {
        for event in &events {
            let event_type = event.event_type();
            let data =
                serde_json::to_string(event).map_err(|e| PortError::Persistence(e.to_string()))?;
            let occurred_at = event.occurred_at().to_rfc3339();

            sqlx::query("INSERT INTO events (event_type, data, occurred_at) VALUES (?, ?, ?)")
                .bind(event_type)
                .bind(&data)
                .bind(&occurred_at)
                .execute(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;
        }
        Ok(())
    }
}
