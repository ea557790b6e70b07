/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `boards`: Board CRUD
/// - `tasks`: Task CRUD and personal task lists
/// - `comments`: Task comments
/// - `users`: Email lookup

pub mod auth;
pub mod boards;
pub mod comments;
pub mod health;
pub mod tasks;
pub mod users;
