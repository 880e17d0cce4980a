use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::models::{Role, User};

/// Each populated field narrows the result set (AND across fields); values
/// within a field are OR'd via `ANY`. Absent fields impose no constraint.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub roles: Vec<Role>,
    pub emails: Vec<String>,
    pub ids: Vec<Uuid>,
}

pub async fn create(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (first_name, last_name, email, password_hash, role)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = lower($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool, filter: &ListFilter) -> Result<Vec<User>, sqlx::Error> {
    let mut qb: QueryBuilder<'_, sqlx::Postgres> = QueryBuilder::new("SELECT * FROM users");
    let mut sep = " WHERE ";

    if !filter.roles.is_empty() {
        qb.push(sep).push("role = ANY(");
        qb.push_bind(filter.roles.clone()).push(")");
        sep = " AND ";
    }
    if !filter.emails.is_empty() {
        qb.push(sep).push("email = ANY(");
        qb.push_bind(filter.emails.clone()).push(")");
        sep = " AND ";
    }
    if !filter.ids.is_empty() {
        qb.push(sep).push("id = ANY(");
        qb.push_bind(filter.ids.clone()).push(")");
    }

    qb.push(" ORDER BY created_at DESC");
    qb.build_query_as::<User>().fetch_all(pool).await
}

#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub team: Option<Vec<Uuid>>,
}

/// Partial field update. Returns the updated record, or None if the id does
/// not exist.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    patch: &ProfilePatch,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            team = COALESCE($5, team)
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(patch.first_name.as_deref())
    .bind(patch.last_name.as_deref())
    .bind(patch.email.as_deref())
    .bind(patch.team.as_deref())
    .fetch_optional(pool)
    .await
}

pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a user and clean up every reference to it: owned events go away
/// via the FK cascade, and the id is removed from all managers' team lists
/// in the same transaction. Returns false if no record existed.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET team = array_remove(team, $1) WHERE $1 = ANY(team)")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}
