pub mod gateway;
pub mod persistence;
