pub mod analyze;
pub mod auth;
pub mod corpus;
pub mod health;
