//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::cache::QueryKey;
use crate::domain::Time;
use crate::planner::{
    DepartAfterQuery, DetailedJourneys, JourneyResultBuilder, PlanError, PlanRequest, SummaryJourneys,
    TimeRangeQuery, validate_window,
};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(plan_summary))
        .route("/detail", get(plan_detailed))
        .route("/first-arrival", get(first_arrival))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router for a dedicated health-check address.
pub fn health_router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Validated inputs of a time-range query.
struct RangeParams {
    request: PlanRequest,
    start: Time,
    end: Time,
    key: QueryKey,
}

impl RangeParams {
    fn from_query(query: &JourneyQuery) -> Result<Self, AppError> {
        let request = query.plan_request();
        request.validate()?;

        let end_date = query.end_date.ok_or_else(|| AppError::BadRequest {
            message: "endDate is required".to_string(),
        })?;
        let start = query.start_time();
        let end = Time::between(request.date, end_date).ok_or_else(|| AppError::BadRequest {
            message: format!("endDate {end_date} is before the service date {}", request.date),
        })?;
        validate_window(start, end)?;

        Ok(Self {
            request,
            start,
            end,
            key: query.cache_key(end_date),
        })
    }
}

/// Run a time-range query off the async runtime.
async fn plan_range<B>(state: &AppState, params: RangeParams, builder: B) -> Result<Vec<B::Output>, AppError>
where
    B: JourneyResultBuilder + Send + 'static,
    B::Output: Send + 'static,
{
    let index = state.index.clone();
    let config = state.config.clone();
    let journeys = tokio::task::spawn_blocking(move || {
        TimeRangeQuery::new(&index, &config, builder).plan(&params.request, params.start, params.end)
    })
    .await??;
    Ok(journeys)
}

/// Time-range query with one timestamp pair per leg.
async fn plan_summary(
    State(state): State<AppState>,
    Query(query): Query<JourneyQuery>,
) -> Result<Response, AppError> {
    let params = RangeParams::from_query(&query)?;
    let key = params.key.clone();

    if let Some(cached) = state.cache.get_summary(&key).await {
        return Ok(Json(cached.as_slice()).into_response());
    }

    let journeys = Arc::new(plan_range(&state, params, SummaryJourneys).await?);
    state.cache.insert_summary(key, journeys.clone()).await;

    Ok(Json(journeys.as_slice()).into_response())
}

/// Time-range query with every stop time of every leg.
async fn plan_detailed(
    State(state): State<AppState>,
    Query(query): Query<JourneyQuery>,
) -> Result<Response, AppError> {
    let params = RangeParams::from_query(&query)?;
    let key = params.key.clone();

    if let Some(cached) = state.cache.get_detailed(&key).await {
        return Ok(Json(cached.as_slice()).into_response());
    }

    let journeys = Arc::new(plan_range(&state, params, DetailedJourneys).await?);
    state.cache.insert_detailed(key, journeys.clone()).await;

    Ok(Json(journeys.as_slice()).into_response())
}

/// Journeys leaving no earlier than `startDate`, one per leg count.
async fn first_arrival(
    State(state): State<AppState>,
    Query(query): Query<JourneyQuery>,
) -> Result<Response, AppError> {
    let request = query.plan_request();
    request.validate()?;
    let departure = query.start_time();

    let index = state.index.clone();
    let config = state.config.clone();
    let journeys = tokio::task::spawn_blocking(move || {
        DepartAfterQuery::new(&index, &config, DetailedJourneys).plan(&request, departure)
    })
    .await??;

    Ok(Json(journeys).into_response())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl From<PlanError> for AppError {
    fn from(e: PlanError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal {
            message: format!("query task failed: {e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => {
                warn!(%message, "rejected request");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Internal { message } => {
                error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chrono::NaiveDate;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::cache::{CacheConfig, JourneyCache};
    use crate::domain::{Calendar, ServiceId, StopId, StopTime, Trip, TripId};
    use crate::planner::{ScheduleIndex, SearchConfig};

    fn trip(id: &str, calls: &[(&str, u32, u32)]) -> Trip {
        Trip {
            id: TripId::new(id),
            stop_times: calls
                .iter()
                .map(|&(stop, h, m)| {
                    let time = Time::from_seconds(h * 3600 + m * 60);
                    StopTime::new(stop, time, time)
                })
                .collect(),
            service_id: ServiceId::new("1"),
            train_uid: Some(format!("{id}_X")),
        }
    }

    fn state() -> AppState {
        let start = NaiveDate::from_ymd_opt(2018, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2099, 12, 31).unwrap();
        let index = ScheduleIndex::build(
            vec![
                trip("T1", &[("A", 9, 0), ("B", 10, 0), ("C", 10, 30)]),
                trip("T2", &[("A", 11, 0), ("C", 12, 0)]),
            ],
            vec![],
            HashMap::new(),
            vec![Calendar::daily("1", start, end)],
        )
        .unwrap();
        AppState::new(index, SearchConfig::default(), JourneyCache::new(&CacheConfig::default()))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, body)
    }

    const WINDOW: &str = "startDate=2018-10-16T08:00:00&endDate=2018-10-16T12:00:00";

    #[tokio::test]
    async fn health_check() {
        let (status, body) = get(create_router(state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("ok".into()));

        let (status, _) = get(health_router(), "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_lists_each_departure() {
        let (status, body) = get(create_router(state()), &format!("/?orig=A&dest=C&{WINDOW}")).await;

        assert_eq!(status, StatusCode::OK);
        let journeys = body.as_array().unwrap();
        assert_eq!(journeys.len(), 2);
        assert_eq!(journeys[0]["legs"][0]["departureTime"], "2018-10-16T09:00:00");
        assert_eq!(journeys[0]["legs"][0]["arrivalTime"], "2018-10-16T10:30:00");
        assert_eq!(journeys[1]["legs"][0]["departureTime"], "2018-10-16T11:00:00");
    }

    #[tokio::test]
    async fn summary_results_are_cached() {
        let state = state();
        let uri = format!("/?orig=A&dest=C&{WINDOW}&notVia=B");

        let (status, _) = get(create_router(state.clone()), &uri).await;
        assert_eq!(status, StatusCode::OK);

        let start = NaiveDate::from_ymd_opt(2018, 10, 16).unwrap();
        let key = QueryKey::new(
            StopId::new("A"),
            StopId::new("C"),
            start.and_hms_opt(8, 0, 0).unwrap(),
            start.and_hms_opt(12, 0, 0).unwrap(),
            &[StopId::new("B")],
        );
        let cached = state.cache.get_summary(&key).await.unwrap();
        // B is excluded, so only the direct departure remains
        assert_eq!(cached.len(), 1);
        assert!(state.cache.get_detailed(&key).await.is_none());
    }

    #[tokio::test]
    async fn detail_has_tagged_legs() {
        let (status, body) = get(create_router(state()), &format!("/detail?orig=A&dest=B&{WINDOW}")).await;

        assert_eq!(status, StatusCode::OK);
        let leg = &body[0]["legs"][0];
        assert_eq!(leg["type"], "RAIL_LEG");
        assert_eq!(leg["originTrainUid"], "T1");
        assert_eq!(leg["trainTrip"]["stopTimes"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn first_arrival_departs_after_start() {
        let (status, body) =
            get(create_router(state()), "/first-arrival?orig=A&dest=C&startDate=2018-10-16T09:30:00").await;

        assert_eq!(status, StatusCode::OK);
        let journeys = body.as_array().unwrap();
        assert_eq!(journeys.len(), 1);
        assert_eq!(journeys[0]["legs"][0]["departureTime"], "2018-10-16T11:00:00");
    }

    #[tokio::test]
    async fn excluded_origin_is_rejected() {
        let (status, body) = get(create_router(state()), &format!("/?orig=A&dest=C&{WINDOW}&notVia=A,B")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Origin: A in not via list: A,B");
    }

    #[tokio::test]
    async fn excluded_destination_is_rejected_on_first_arrival() {
        let (status, body) = get(
            create_router(state()),
            "/first-arrival?orig=A&dest=C&startDate=2018-10-16T09:30:00&notVia=C",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Destination: C in not via list: C");
    }

    #[tokio::test]
    async fn range_requires_end_date() {
        let (status, body) =
            get(create_router(state()), "/detail?orig=A&dest=C&startDate=2018-10-16T09:30:00").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "endDate is required");
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let (status, _) = get(
            create_router(state()),
            "/?orig=A&dest=C&startDate=2018-10-16T12:00:00&endDate=2018-10-16T08:00:00",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_stop_finds_nothing() {
        let (status, body) = get(create_router(state()), &format!("/?orig=A&dest=Z&{WINDOW}")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(vec![]));
    }
}
