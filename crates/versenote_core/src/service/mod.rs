//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate reconciliation and repository calls into use-case APIs.
//! - Keep CLI callers decoupled from storage details.

pub mod document_service;
pub mod verse_import;
