use std::convert::Infallible;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::{Months, NaiveDate};
use futures_util::Stream;
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Event, EventType, Role};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    pub user_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
}

pub async fn upsert(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpsertRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let (Some(date), Some(event_type)) = (req.date, req.event_type) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    // Default owner is the caller; setting status for someone else takes
    // admin or manager.
    let user_id = req.user_id.unwrap_or(auth.user_id);
    if user_id != auth.user_id && !auth.can_act_for_others() {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    tracing::info!("Set status for user {user_id} on {date}: {event_type:?}");
    let event = db::events::upsert(&state.pool, user_id, date, event_type).await?;
    state.notifier.notify(user_id);

    Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    pub year: Option<String>,
    pub month: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
}

/// Drop query values the original UI could send malformed: unknown types,
/// months outside 1-12, years before 2000.
fn sanitize(query: &ListQuery) -> (Option<i32>, Option<u32>, Option<EventType>) {
    let year = query
        .year
        .as_deref()
        .and_then(|y| y.parse::<i32>().ok())
        .filter(|y| *y >= 2000);

    let month = query
        .month
        .as_deref()
        .and_then(|m| m.parse::<u32>().ok())
        .filter(|m| (1..=12).contains(m));

    let event_type = match query.event_type.as_deref() {
        Some("office") => Some(EventType::Office),
        Some("vacation") => Some(EventType::Vacation),
        _ => None,
    };

    (year, month, event_type)
}

fn date_range(year: Option<i32>, month: Option<u32>) -> Option<(NaiveDate, NaiveDate)> {
    let year = year?;
    match month {
        Some(month) => {
            let start = NaiveDate::from_ymd_opt(year, month, 1)?;
            let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
            Some((start, end))
        }
        None => Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        )),
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let (year, month, event_type) = sanitize(&query);

    // Coworkers only see their own calendar; admin and manager may name
    // any user.
    let user_id = match query.user_id {
        Some(id) if auth.can_act_for_others() => id,
        _ => auth.user_id,
    };

    let filter = db::events::ListFilter {
        user_id: Some(user_id),
        event_type,
        range: date_range(year, month),
    };

    tracing::info!(
        "List events: user={user_id} year={year:?} month={month:?} type={event_type:?}"
    );
    let events = db::events::list(&state.pool, &filter).await?;
    Ok(Json(events))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub date: Option<NaiveDate>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
}

fn require_owner_or_admin(auth: &AuthUser, event: &Event) -> Result<(), AppError> {
    match auth.role {
        Role::Admin => Ok(()),
        Role::Manager | Role::Coworker if event.user_id == auth.user_id => Ok(()),
        _ => Err(AppError::Forbidden("Forbidden".to_string())),
    }
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<Event>, AppError> {
    let existing = db::events::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    require_owner_or_admin(&auth, &existing)?;

    // Moving an event onto a date that already holds one for the same user
    // trips the (user_id, date) unique index; report it as a client error.
    let event = db::events::update(&state.pool, id, req.date, req.event_type)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::BadRequest("An event already exists for that date".to_string())
            }
            _ => AppError::Database(e),
        })?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    tracing::info!("Event updated for user: {}, eventId: {id}", event.user_id);
    state.notifier.notify(event.user_id);
    Ok(Json(event))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let existing = db::events::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
    require_owner_or_admin(&auth, &existing)?;

    let owner = db::events::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    tracing::info!("Event deleted for user: {owner}, eventId: {id}");
    state.notifier.notify(owner);
    Ok(StatusCode::NO_CONTENT)
}

/// Live updates: one SSE message per event mutation, carrying the affected
/// user id.
pub async fn live(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.notifier.subscribe();

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(user_id) => {
                    let msg = SseEvent::default()
                        .event("event-update")
                        .data(user_id.to_string());
                    return Some((Ok(msg), rx));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
