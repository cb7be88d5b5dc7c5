use crate::api::{AppError, AppJson, AppQuery, AppState, CurrentUser};
use crate::model::{NormalizedOffer, SavedFlight};
use crate::service::{FlightView, MultiSearchParams, SaveFlightRequest, SearchParams};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct NotificationsUpdate {
    pub notifications: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", get(list_flights).post(save_flight))
        .route("/flights/search", get(search_flights))
        .route("/flights/search/multi", get(search_flights_multi))
        .route(
            "/flights/{id}",
            get(get_flight).delete(delete_flight).put(update_notifications),
        )
}

async fn search_flights(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Json<Vec<NormalizedOffer>>, AppError> {
    Ok(Json(state.service.search(params).await?))
}

async fn search_flights_multi(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<MultiSearchParams>,
) -> Result<Json<Vec<NormalizedOffer>>, AppError> {
    Ok(Json(state.service.search_multi(params).await?))
}

async fn list_flights(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<FlightView>>, AppError> {
    Ok(Json(state.service.list(&user).await?))
}

async fn save_flight(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(request): AppJson<SaveFlightRequest>,
) -> Result<(StatusCode, Json<SavedFlight>), AppError> {
    let flight = state.service.save(&user, request).await?;
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn get_flight(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<FlightView>, AppError> {
    Ok(Json(state.service.get(&user, &id).await?))
}

async fn delete_flight(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.service.delete(&user, &id).await?;
    Ok(Json(json!({ "message": "Flight deleted" })))
}

async fn update_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    AppJson(update): AppJson<NotificationsUpdate>,
) -> Result<Json<SavedFlight>, AppError> {
    Ok(Json(state.service.set_notifications(&user, &id, update.notifications).await?))
}
