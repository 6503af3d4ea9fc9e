use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid country code")]
    InvalidCountryCode,
    #[error("invalid area code")]
    InvalidAreaCode,
    #[error("invalid subscriber number")]
    InvalidSubscriberNumber,
    #[error("invalid national id")]
    InvalidNationalId,
    #[error("name too short")]
    NameTooShort,
    #[error("surname too short")]
    SurnameTooShort,
    #[error("invalid confirmation code")]
    InvalidCode,
    #[error("code expired")]
    CodeExpired,
    #[error("session is already confirmed")]
    SessionAlreadyConfirmed,
    #[error("verification not completed")]
    VerificationIncomplete,
    #[error("referral requires a direct sponsor")]
    ReferralRequiresSponsor,
    #[error("invalid id: {0}")]
    InvalidId(String),
}
