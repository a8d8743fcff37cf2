//! API handlers module

pub mod auth;
pub mod chat;
pub mod health;
pub mod hukamnama;
pub mod models;
pub mod seva;
pub mod shabad;
