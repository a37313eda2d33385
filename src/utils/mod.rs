// Utility modules
// Calendar arithmetic shared by models and services

pub mod date;
pub mod lunar;
