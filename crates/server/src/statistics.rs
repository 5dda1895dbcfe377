//! Statistics API endpoint

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;

use crate::{
    server::ServerState,
    types::stats::{Statistic, StatsQuery},
};

/// Dashboard figures over the local replica.
pub async fn get_stats(
    State(state): State<ServerState>,
    Query(query): Query<StatsQuery>,
) -> Json<Statistic> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let stats = state.console.report(today).await;

    Json(Statistic {
        today,
        new_members: stats.new_members,
        active_members: stats.active_members,
        expired_members: stats.expired_members,
        gym_collected: stats.gym_collected.minor(),
        gym_due: stats.gym_due.minor(),
        supplement_sales: stats.supplement_sales.minor(),
        supplement_due: stats.supplement_due.minor(),
        supplements_sold: stats.supplements_sold,
    })
}
