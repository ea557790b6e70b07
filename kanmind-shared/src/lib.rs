//! # KanMind Shared Library
//!
//! Domain types, persistence and business rules for the KanMind Kanban
//! backend. The HTTP server in `kanmind-api` is a thin layer over the
//! `services` module.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `store`: Persistence seam (`KanbanStore`) with PostgreSQL and in-memory backends
//! - `services`: Domain operations (accounts, boards, tasks, comments)
//! - `auth`: Password hashing, tokens, permission predicates, request middleware
//! - `db`: Connection pool and migrations
//! - `error`: Domain error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the KanMind shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
