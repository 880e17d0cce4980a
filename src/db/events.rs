use chrono::NaiveDate;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::{Event, EventType};

/// Set the attendance status for a user on a date. If a row already exists
/// for `(user_id, date)` its type is replaced in place; the store's atomic
/// conditional update makes repeated calls converge without duplicates.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
    event_type: EventType,
) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "INSERT INTO events (user_id, date, type) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, date)
         DO UPDATE SET type = EXCLUDED.type, updated_at = now()
         RETURNING *",
    )
    .bind(user_id)
    .bind(date)
    .bind(event_type)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Direct field patch by event id, used for corrections. None if not found.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    date: Option<NaiveDate>,
    event_type: Option<EventType>,
) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(
        "UPDATE events SET
            date = COALESCE($2, date),
            type = COALESCE($3, type),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(date)
    .bind(event_type)
    .fetch_optional(pool)
    .await
}

/// Returns the owner's id if a record was removed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
    let row: Option<(Uuid,)> = sqlx::query_as("DELETE FROM events WHERE id = $1 RETURNING user_id")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(user_id,)| user_id))
}

#[derive(Debug, Default)]
pub struct ListFilter {
    pub user_id: Option<Uuid>,
    pub event_type: Option<EventType>,
    /// Inclusive date range, first to last day.
    pub range: Option<(NaiveDate, NaiveDate)>,
}

pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<Event>, sqlx::Error> {
    let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new("SELECT * FROM events");
    let mut sep = " WHERE ";

    if let Some(user_id) = filter.user_id {
        qb.push(sep).push("user_id = ");
        qb.push_bind(user_id);
        sep = " AND ";
    }
    if let Some(event_type) = filter.event_type {
        qb.push(sep).push("type = ");
        qb.push_bind(event_type);
        sep = " AND ";
    }
    if let Some((start, end)) = filter.range {
        qb.push(sep).push("date BETWEEN ");
        qb.push_bind(start);
        qb.push(" AND ");
        qb.push_bind(end);
    }

    qb.push(" ORDER BY date");
    qb.build_query_as::<Event>().fetch_all(pool).await
}
