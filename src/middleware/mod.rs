// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (shared-secret auth, sessions, security headers).

pub mod internal;
pub mod security;
pub mod session;

pub use internal::require_internal_token;
pub use session::{require_session, SessionClaims, SessionUser};
