//! Relative time labels ("3 days ago").
//!
//! Elements carrying `hx-get="/time-ago?date=..."` swap in a label computed
//! with the store's configured, localized unit names.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use zid_theme_core::time_ago::{format_time_ago, parse_timestamp};

use crate::state::AppState;

/// Query parameters for [`time_ago`].
#[derive(Debug, Deserialize)]
pub struct TimeAgoQuery {
    pub date: String,
}

/// Format `date` relative to now.
///
/// Unparseable dates answer `204 No Content`, leaving the element's text as
/// rendered.
pub async fn time_ago(State(state): State<AppState>, Query(query): Query<TimeAgoQuery>) -> Response {
    match parse_timestamp(&query.date) {
        Some(then) => {
            format_time_ago(then, Utc::now(), &state.config().time_ago_labels).into_response()
        }
        None => {
            tracing::debug!(date = %query.date, "Ignoring unparseable date");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
