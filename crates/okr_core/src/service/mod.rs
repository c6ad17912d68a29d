//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into OKR commands and dashboard reads.
//! - Keep the HTTP layer decoupled from storage details.

pub mod dashboard_service;
pub mod okr_service;
