use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::AppError;
use crate::models::{Role, User};
use crate::state::SharedState;
use crate::validation::{
    self, ValidationCode, normalize_email, validate_email_format, validate_first_name,
    validate_last_name,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
}

pub async fn register(
    auth: Option<AuthUser>,
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    tracing::info!("User registration attempt: {}", req.email);

    // Anyone may register as a coworker. An elevated role takes an admin
    // caller, except for the very first account (initial setup).
    let role = req.role.unwrap_or(Role::Coworker);
    if role != Role::Coworker && db::users::count_all(&state.pool).await? > 0 {
        match auth {
            Some(caller) => caller.require_role(&[Role::Admin])?,
            None => return Err(AppError::Forbidden("Forbidden".to_string())),
        }
    }

    validate_first_name(&req.first_name)?;
    validate_last_name(&req.last_name)?;
    validate_email_format(&req.email)?;

    let email = normalize_email(&req.email);
    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        tracing::warn!("Email already registered: {email}");
        return Err(ValidationCode::EmailTaken.into());
    }

    validation::validate_password(&req.password)?;

    let password_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    let user = db::users::create(
        &state.pool,
        &req.first_name,
        &req.last_name,
        &email,
        &password_hash,
        role,
    )
    .await?;

    tracing::info!("User registered: {} ({})", user.email, user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub roles: Option<String>,
    pub emails: Option<String>,
    pub ids: Option<String>,
}

fn split_csv(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_filter(query: &ListQuery) -> Result<db::users::ListFilter, AppError> {
    let mut filter = db::users::ListFilter::default();

    if let Some(raw) = &query.roles {
        for part in split_csv(raw) {
            let role = Role::from_str(part)
                .map_err(|_| AppError::BadRequest(format!("Unknown role: {part}")))?;
            filter.roles.push(role);
        }
    }
    if let Some(raw) = &query.emails {
        filter.emails = split_csv(raw).map(normalize_email).collect();
    }
    if let Some(raw) = &query.ids {
        for part in split_csv(raw) {
            let id = Uuid::parse_str(part)
                .map_err(|_| AppError::BadRequest(format!("Invalid user id: {part}")))?;
            filter.ids.push(id);
        }
    }

    Ok(filter)
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    auth.require_role(&[Role::Admin, Role::Manager])?;

    let filter = parse_filter(&query)?;
    let users = db::users::list(&state.pool, &filter).await?;
    tracing::info!("Fetched {} users", users.len());
    Ok(Json(users))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub team: Option<Vec<Uuid>>,
    /// Direct password writes are rejected; the three-field flow below is
    /// the only way to change a password.
    pub password: Option<String>,
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// The secured three-field password change. Preconditions are checked in a
/// fixed order so each failure maps to one stable code.
async fn apply_password_change(
    state: &SharedState,
    target: Uuid,
    req: &UpdateRequest,
) -> Result<(), AppError> {
    let (old, new, confirm) = match (&req.old_password, &req.new_password, &req.confirm_password) {
        (Some(old), Some(new), Some(confirm)) => (old, new, confirm),
        _ => return Err(ValidationCode::PasswordFieldsIncomplete.into()),
    };

    if new != confirm {
        return Err(ValidationCode::PasswordConfirmMismatch.into());
    }

    let user = db::users::find_by_id(&state.pool, target)
        .await?
        .ok_or(ValidationCode::PasswordUserMissing)?;

    let valid = password::verify(old, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        tracing::warn!("Password change rejected - old password invalid for user {target}");
        return Err(ValidationCode::PasswordOldInvalid.into());
    }

    validation::validate_password(new)?;

    let password_hash = password::hash(new).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, target, &password_hash).await?;
    tracing::info!("Password changed for user {target}");
    Ok(())
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<User>, AppError> {
    // Profile updates permit no override beyond self, admins included.
    auth.require_self(id)?;

    if req.password.is_some() {
        return Err(ValidationCode::PasswordDirectSet.into());
    }

    // Every field is validated before anything is written, so a 400 means
    // nothing changed and the same request can be resubmitted.
    if let Some(first_name) = &req.first_name {
        validate_first_name(first_name)?;
    }
    if let Some(last_name) = &req.last_name {
        validate_last_name(last_name)?;
    }
    let email = match &req.email {
        Some(raw) => {
            validate_email_format(raw)?;
            let email = normalize_email(raw);
            if let Some(existing) = db::users::find_by_email(&state.pool, &email).await? {
                if existing.id != id {
                    return Err(ValidationCode::EmailTaken.into());
                }
            }
            Some(email)
        }
        None => None,
    };

    let wants_password_change =
        req.old_password.is_some() || req.new_password.is_some() || req.confirm_password.is_some();
    if wants_password_change {
        apply_password_change(&state, id, &req).await?;
    }

    let patch = db::users::ProfilePatch {
        first_name: req.first_name,
        last_name: req.last_name,
        team: req.team,
        email,
    };

    let user = db::users::update(&state.pool, id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!("User updated: {id}");
    Ok(Json(user))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_self_or_admin(id)?;

    let removed = db::users::delete(&state.pool, id).await?;
    if !removed {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!("User deleted: {id}");
    Ok(StatusCode::NO_CONTENT)
}
