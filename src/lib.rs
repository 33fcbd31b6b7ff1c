//! Mental-wellness chat and journaling service: emotion detection on every
//! message and journal entry, and mood analytics over the resulting history.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod emotion;
pub mod error;
pub mod history;
pub mod journal;
