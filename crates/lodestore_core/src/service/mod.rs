//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate the once-per-run normalize/statistics/persist sequence.
//! - Keep reporting consumers decoupled from storage details.

pub mod report_service;
