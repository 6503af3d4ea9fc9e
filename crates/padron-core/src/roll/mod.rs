use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::{DomainEvent, ReferralRecorded, VoterCheckedIn};
use crate::ids::ReferralId;
use crate::registrant::NationalId;

/// One line of the voter roll as delivered by the electoral authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollEntry {
    pub document: NationalId,
    pub full_name: String,
    pub sex: String,
    pub circuit_code: String,
    pub table_number: u32,
    pub ballot_order: u32,
}

/// A voter brought in under a sponsor chain: the superior responsible, an
/// optional intermediate and the person who directly referred them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    id: ReferralId,
    document: NationalId,
    superior_id: i64,
    intermediate: Option<String>,
    direct: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl Referral {
    pub fn new(
        document: NationalId,
        superior_id: i64,
        intermediate: Option<String>,
        direct: String,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Result<(Self, Vec<DomainEvent>), DomainError> {
        let direct = direct.trim().to_string();
        if direct.is_empty() {
            return Err(DomainError::ReferralRequiresSponsor);
        }
        let id = ReferralId::new();
        let referral = Self {
            id: id.clone(),
            document: document.clone(),
            superior_id,
            intermediate: intermediate
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            direct,
            created_by,
            created_at: now,
        };
        let events = vec![DomainEvent::ReferralRecorded(ReferralRecorded {
            referral_id: id,
            document: document.to_string(),
            occurred_at: now,
        })];
        Ok((referral, events))
    }

    pub fn id(&self) -> &ReferralId {
        &self.id
    }

    pub fn document(&self) -> &NationalId {
        &self.document
    }

    pub fn superior_id(&self) -> i64 {
        self.superior_id
    }

    pub fn intermediate(&self) -> Option<&str> {
        self.intermediate.as_deref()
    }

    pub fn direct(&self) -> &str {
        &self.direct
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A voter marked as present at the table by a poll watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub document: NationalId,
    pub verified_by: String,
    pub verified_at: DateTime<Utc>,
}

impl CheckIn {
    pub fn new(
        document: NationalId,
        verified_by: String,
        now: DateTime<Utc>,
    ) -> (Self, Vec<DomainEvent>) {
        let check_in = Self {
            document: document.clone(),
            verified_by: verified_by.clone(),
            verified_at: now,
        };
        let events = vec![DomainEvent::VoterCheckedIn(VoterCheckedIn {
            document: document.to_string(),
            verified_by,
            occurred_at: now,
        })];
        (check_in, events)
    }
}
