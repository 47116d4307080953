/**
 * Routes Module
 * API route handlers
 */
pub mod auth;
pub mod contacts;
pub mod health;

use serde::{Deserialize, Serialize};

/// Uniform error body: `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Plain informational reply used by the email-confirmation endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
