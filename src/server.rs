use crate::AppError;
use crate::config::AppConfig;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{info, warn};
use std::time::Duration;
use timetable_solver::data::{SchedulingInput, SchedulingOutput};
use timetable_solver::solver;
use tower::limit::ConcurrencyLimitLayer;

#[derive(Debug, Clone, Copy)]
struct SolveSettings {
    default_time_limit: Duration,
}

async fn solve_handler(
    State(settings): State<SolveSettings>,
    Json(input): Json<SchedulingInput>,
) -> Result<Json<SchedulingOutput>, (StatusCode, String)> {
    let problem = input.build().map_err(|e| {
        warn!("Rejected scheduling input: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;
    let budget = input
        .time_limit_ms
        .map(Duration::from_millis)
        .unwrap_or(settings.default_time_limit);

    // search is CPU bound, keep it off the async workers
    let output = tokio::task::spawn_blocking(move || {
        let result = solver::solve(&problem, budget);
        SchedulingOutput::new(&problem, &result)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("solver task failed: {}", e),
        )
    })?;

    Ok(Json(output))
}

pub fn router(config: &AppConfig) -> Router {
    Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_solves))
        .with_state(SolveSettings {
            default_time_limit: config.time_limit,
        })
}

pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let app = router(&config);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(AppError::Server)?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
