//! Dashboard routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use wayfare_core::access::ProcedureTier;
use wayfare_core::dashboard::{DateRange, MyDashboard, Overview};

use crate::middleware::AuthUser;
use crate::{ApiResult, AppState};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/me", get(my_dashboard))
        .route("/dashboard/overview", get(overview))
}

/// Query parameters for the overview.
#[derive(Debug, Deserialize)]
pub struct OverviewQuery {
    /// First day (YYYY-MM-DD). Defaults to January 1st of `to`'s year.
    pub from: Option<NaiveDate>,
    /// Last day (YYYY-MM-DD). Defaults to today.
    pub to: Option<NaiveDate>,
}

/// GET `/dashboard/me` - The caller's own numbers.
async fn my_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<MyDashboard>> {
    Ok(Json(state.dashboard().me(auth.actor()).await?))
}

/// GET `/dashboard/overview` - Company-wide claim totals for managers and up.
async fn overview(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<OverviewQuery>,
) -> ApiResult<Json<Overview>> {
    auth.require(ProcedureTier::ManagerOrAbove)?;

    let to = query.to.unwrap_or_else(|| Utc::now().date_naive());
    let from = query
        .from
        .or_else(|| NaiveDate::from_ymd_opt(to.year(), 1, 1))
        .unwrap_or(to);
    let range = DateRange::new(from, to)?;

    Ok(Json(state.dashboard().overview(range).await?))
}
