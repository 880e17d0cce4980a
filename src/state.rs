use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::notify::EventNotifier;
use crate::rate_limit::LoginRateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub notifier: EventNotifier,
    pub login_limiter: LoginRateLimiter,
}
