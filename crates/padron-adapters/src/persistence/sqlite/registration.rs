use async_trait::async_trait;

use padron_core::registration::Registration;
use padron_ports::error::PortError;
use padron_ports::outbound::RegistrationRepository;

use super::SqliteDb;

#[async_trait]
impl RegistrationRepository for SqliteDb {
    async fn save(&self, registration: &Registration) -> Result<(), PortError> {
        let national_id = registration.registrant().national_id().to_string();
        let data = serde_json::to_string(registration)
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        let registered_at = registration.registered_at().to_rfc3339();

        // keyed by national id so a retried finalize overwrites instead of
        // duplicating
        sqlx::query(
            "INSERT INTO registrations (national_id, data, registered_at)
             VALUES (?, ?, ?)
             ON CONFLICT(national_id) DO UPDATE SET
                data = excluded.data,
                registered_at = excluded.registered_at",
        )
        .bind(&national_id)
        .bind(&data)
        .bind(&registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(())
    }

    async fn find_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<Registration>, PortError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM registrations WHERE national_id = ?")
                .bind(national_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PortError::Persistence(e.to_string()))?;

        match row {
            Some((data,)) => {
                let registration: Registration = serde_json::from_str(&data)
                    .map_err(|e| PortError::Persistence(e.to_string()))?;
                Ok(Some(registration))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padron_core::registrant::{NationalId, PhoneNumber, RegistrantIdentity};
    use padron_core::verification::OtpSession;

    fn ts(s: &str) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    async fn db() -> SqliteDb {
        SqliteDb::new("sqlite::memory:").await.unwrap()
    }

    fn make_registration(national_id: &str, subscriber: &str) -> Registration {
        let identity =
            RegistrantIdentity::new("Ana", "Gomez", NationalId::new(national_id).unwrap())
                .unwrap();
        let phone = PhoneNumber::new("54", "11", subscriber).unwrap();
        let (mut session, _) = OtpSession::start(identity, phone, ts("2025-10-26T08:00:00Z"));
        session.confirm(ts("2025-10-26T08:00:30Z")).unwrap();
        let (registration, _) =
            Registration::from_session(&session, ts("2025-10-26T08:00:31Z")).unwrap();
        registration
    }

    #[tokio::test]
    async fn save_and_find_by_national_id() {
        let db = db().await;
        let registration = make_registration("30111222", "40001234");

        db.save(&registration).await.unwrap();

        let found = db.find_by_national_id("30111222").await.unwrap().unwrap();
        assert_eq!(found.registrant().national_id().as_str(), "30111222");
        assert_eq!(found.phone().dispatch(), "541140001234");
    }

    #[tokio::test]
    async fn find_unknown_returns_none() {
        let db = db().await;
        let found = db.find_by_national_id("20555666").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn save_again_replaces_the_record() {
        let db = db().await;
        db.save(&make_registration("30111222", "40001234"))
            .await
            .unwrap();
        db.save(&make_registration("30111222", "40009999"))
            .await
            .unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM registrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        let found = db.find_by_national_id("30111222").await.unwrap().unwrap();
        assert_eq!(found.phone().dispatch(), "541140009999");
    }
}
