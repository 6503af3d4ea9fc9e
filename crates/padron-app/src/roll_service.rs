use async_trait::async_trait;
use chrono::{DateTime, Utc};

use padron_core::ids::ReferralId;
use padron_core::registrant::NationalId;
use padron_core::roll::{CheckIn, Referral, RollEntry};
use padron_ports::error::DeskError;
use padron_ports::inbound::RollDesk;
use padron_ports::outbound::{EventPublisher, RollRepository};
use padron_ports::types::RawReferral;

/// Roll-side data entry: looks documents up on the voter roll, records
/// referrals under their sponsor chain and marks voters as present at the
/// table.
pub struct RollService<RR, EP>
where
    RR: RollRepository,
    EP: EventPublisher,
{
    roll: RR,
    events: EP,
}

impl<RR, EP> RollService<RR, EP>
where
    RR: RollRepository,
    EP: EventPublisher,
{
    pub fn new(roll: RR, events: EP) -> Self {
        Self { roll, events }
    }

    /// Look a document up on the roll. The entry is returned in full so
    /// the desk can show name, circuit and table before any data entry.
    pub async fn verify_document(&self, document: &str) -> Result<RollEntry, DeskError> {
        let document = NationalId::new(document)?;
        self.roll
            .find_entry(document.as_str())
            .await?
            .ok_or(DeskError::NotOnRoll)
    }

    /// Record a referral for a voter on the roll. The referred document
    /// must match a roll entry and the referral must name a direct
    /// sponsor.
    pub async fn record_referral(
        &self,
        referral: RawReferral,
        now: DateTime<Utc>,
    ) -> Result<ReferralId, DeskError> {
        let document = NationalId::new(&referral.document)?;
        if self.roll.find_entry(document.as_str()).await?.is_none() {
            return Err(DeskError::NotOnRoll);
        }

        let (referral, events) = Referral::new(
            document,
            referral.superior_id,
            Some(referral.intermediate),
            referral.direct,
            referral.created_by,
            now,
        )?;
        self.roll.save_referral(&referral).await?;
        self.events.publish(events).await?;
        Ok(referral.id().clone())
    }

    /// Mark a voter as verified at the table. A voter is checked in at
    /// most once.
    pub async fn check_in(
        &self,
        document: &str,
        verified_by: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, DeskError> {
        let document = NationalId::new(document)?;
        if self.roll.find_entry(document.as_str()).await?.is_none() {
            return Err(DeskError::NotOnRoll);
        }
        if self.roll.find_check_in(document.as_str()).await?.is_some() {
            return Err(DeskError::AlreadyCheckedIn);
        }

        let (check_in, events) = CheckIn::new(document, verified_by.to_string(), now);
        self.roll.save_check_in(&check_in).await?;
        self.events.publish(events).await?;
        Ok(check_in)
    }

    pub async fn checked_in(&self) -> Result<Vec<CheckIn>, DeskError> {
        Ok(self.roll.list_checked_in().await?)
    }
}

#[async_trait]
impl<RR, EP> RollDesk for RollService<RR, EP>
where
    RR: RollRepository,
    EP: EventPublisher,
{
    async fn verify_document(&self, document: &str) -> Result<RollEntry, DeskError> {
        RollService::verify_document(self, document).await
    }

    async fn record_referral(
        &self,
        referral: RawReferral,
        now: DateTime<Utc>,
    ) -> Result<ReferralId, DeskError> {
        RollService::record_referral(self, referral, now).await
    }

    async fn check_in(
        &self,
        document: &str,
        verified_by: &str,
        now: DateTime<Utc>,
    ) -> Result<CheckIn, DeskError> {
        RollService::check_in(self, document, verified_by, now).await
    }

    async fn checked_in(&self) -> Result<Vec<CheckIn>, DeskError> {
        RollService::checked_in(self).await
    }
}
