// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Every timestamp leaving the backend is RFC3339 UTC with a `Z` suffix,
//! whatever form the provider sent it in.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in the storage format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Convert Unix epoch milliseconds (Vercel's timestamp format).
pub fn millis_to_rfc3339(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(format_utc_rfc3339)
}

/// Re-render any RFC3339 timestamp (any offset, any precision) as UTC `Z`.
///
/// Returns the input unchanged when it cannot be parsed.
pub fn normalize_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| format_utc_rfc3339(dt.with_timezone(&Utc)))
        .unwrap_or_else(|_| raw.to_string())
}
