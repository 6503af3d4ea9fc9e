pub mod roll_service;
pub mod verification_service;
