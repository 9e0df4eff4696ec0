// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQL DDL executed at startup.
//!
//! - ids are UUID v4 text, timestamps RFC3339 UTC text
//! - `users.provider_id` is UNIQUE so sign-in upserts never duplicate
//! - `integrations (project_id, integration_type)` is UNIQUE: one integration
//!   per type per project
//! - credentials live in `integration_secrets`, never next to listed columns

pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    provider TEXT NOT NULL,
    provider_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL,
    name TEXT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    user_id TEXT NOT NULL REFERENCES users(id),
    name TEXT NOT NULL,
    description TEXT NULL,
    project_type TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_projects_user_id ON projects(user_id);

CREATE TABLE IF NOT EXISTS integrations (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL REFERENCES projects(id),
    integration_type TEXT NOT NULL,
    status TEXT NOT NULL,
    display_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (project_id, integration_type)
);

CREATE TABLE IF NOT EXISTS integration_secrets (
    integration_id TEXT PRIMARY KEY NOT NULL REFERENCES integrations(id) ON DELETE CASCADE,
    provider TEXT NOT NULL,
    secret TEXT NOT NULL, -- base64(nonce || AES-256-GCM ciphertext)
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
