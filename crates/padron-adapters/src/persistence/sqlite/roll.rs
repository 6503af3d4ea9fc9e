use async_trait::async_trait;

use padron_core::roll::{CheckIn, Referral, RollEntry};
use padron_ports::error::PortError;
use padron_ports::outbound::RollRepository;

use super::SqliteDb;

#[async_trait]
impl RollRepository for SqliteDb {
    async fn save_entry(&self, entry: &RollEntry) -> Result<(), PortError> {
        let document = entry.document.to_string();
        let data =
            serde_json::to_string(entry).map_err(|e| PortError::Persistence(e.to_string()))?;

        sqlx::query(
            "INSERT INTO roll_entries (document, data)
             VALUES (?, ?)
             ON CONFLICT(document) DO UPDATE SET data = excluded.data",
        )
        .bind(&document)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find_entry(&self, document: &str) -> Result<Option<RollEntry>, PortError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM roll_entries WHERE document = ?")
                .bind(document)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let entry: RollEntry = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    async fn save_referral(&self, referral: &Referral) -> Result<(), PortError> {
        let id = referral.id().to_string();
        let document = referral.document().to_string();
        let data =
            serde_json::to_string(referral).map_err(|e| PortError::Persistence(e.to_string()))?;
        let created_at = referral.created_at().to_rfc3339();

        sqlx::query(
            "INSERT INTO referrals (id, document, data, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&document)
        .bind(&data)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn save_check_in(&self, check_in: &CheckIn) -> Result<(), PortError> {
        let document = check_in.document.to_string();
        let data =
            serde_json::to_string(check_in).map_err(|e| PortError::Persistence(e.to_string()))?;
        let verified_at = check_in.verified_at.to_rfc3339();

        // document is the primary key: a double check-in that slips past
        // the service is rejected here too
        sqlx::query("INSERT INTO check_ins (document, data, verified_at) VALUES (?, ?, ?)")
            .bind(&document)
            .bind(&data)
            .bind(&verified_at)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find_check_in(&self, document: &str) -> Result<Option<CheckIn>, PortError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM check_ins WHERE document = ?")
                .bind(document)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let check_in: CheckIn = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(check_in))
            }
            None => Ok(None),
        }
    }

    async fn list_checked_in(&self) -> Result<Vec<CheckIn>, PortError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM check_ins ORDER BY verified_at")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        let mut check_ins = Vec::with_capacity(rows.len());
        for (data,) in rows {
            let check_in: CheckIn =
                serde_json::from_str(&data).map_err(|e| PortError::Persistence(e.to_string()))?;
            check_ins.push(check_in);
        }
        Ok(check_ins)
    }
}
