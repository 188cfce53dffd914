pub mod accrual;
pub mod billing;
pub mod calendar;
pub mod config;
pub mod error;
pub mod messaging;
pub mod models;
pub mod money;
pub mod receipt;
pub mod routes;
pub mod sanitize;
pub mod state;
pub mod words;
