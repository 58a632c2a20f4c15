// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity Gateway - HTTP sign-up, login and profile service
//!
//! Account creation, password checks, session tokens and user records are
//! delegated to an external identity provider (Firebase Authentication in
//! production). The service only translates HTTP requests into provider
//! calls and guards `/profile` with bearer-token middleware.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Bearer token middleware and extractor
//! - `config` - Environment configuration
//! - `providers` - Identity provider abstraction and implementations

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod state;
