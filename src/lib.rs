//! Credit Scoring API Library
//!
//! Computes consumer credit scores from income, employment, account age and
//! loan repayment history, persists every computation, serves the current
//! score through a read-through cache and announces new scores as events.
//!
//! # Modules
//!
//! - `api`: Router and middleware stack.
//! - `core`: Domain layer (scoring rules, service, models, validation, errors).
//! - `integrations`: Outbound collaborators (score cache, event sink).
//! - `auth`: Bearer token middleware.
//! - `cache`: In-process score cache with per-entry TTL.
//! - `cache_validator`: Checksummed cache entries.
//! - `circuit_breaker`: Circuit breaker around event publishing.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Score persistence.
//! - `errors`: Error handling types.
//! - `events`: Scoring events and publishers.
//! - `handlers`: HTTP request handlers.
//! - `mocks`: In-memory collaborators for tests.
//! - `models`: Request and score data models.
//! - `openapi`: OpenAPI document.
//! - `scoring`: Pure scoring rules.
//! - `service`: Scoring orchestration.
//! - `validation`: Request validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod auth;
pub mod cache;
pub mod cache_validator;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod mocks;
pub mod models;
pub mod openapi;
pub mod scoring;
pub mod service;
pub mod validation;
