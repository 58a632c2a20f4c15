// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication backed by the configured identity provider.
//!
//! ## Auth Flow
//!
//! 1. Client logs in through `POST /login` and receives a session token
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Gateway:
//!    - Asks the identity provider to verify the token
//!    - Attaches the decoded identity (`uid`, email, ...) to the request
//!
//! ## Security
//!
//! - Missing, malformed and rejected tokens all get `403 Unauthorized`
//! - The reason for a rejection is logged, never returned
//! - Verification is bounded by the provider timeout

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::require_auth;
