// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credentials;
pub mod integration;
pub mod project;
pub mod user;

pub use credentials::{mask_secret, CredentialBag, CredentialView, SubmittedCredentials};
pub use integration::{
    ConnectIntegrationRequest, CreateIntegrationRequest, Integration, IntegrationStatus,
    UpdateIntegrationRequest,
};
pub use project::{CreateProjectRequest, ListProjectsQuery, Project, ProjectType};
pub use user::{UpsertUserRequest, UpsertUserResponse, User};
