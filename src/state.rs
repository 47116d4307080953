//! Shared application state, built once at startup and cloned into every
//! handler through the router.

use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::token::TokenService;
use crate::config::AppConfig;
use crate::email::Mailer;
use crate::rate_limit::RateLimiter;
use crate::repository::contacts::ContactRepository;
use crate::repository::users::UserRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub tokens: TokenService,
    pub users: UserRepository,
    pub contacts: ContactRepository,
    pub limiter: RateLimiter,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let tokens = TokenService::new(&config);
        let limiter = RateLimiter::new(
            config.rate_limit_requests,
            config.rate_limit_window_secs,
        );
        let mailer = Mailer::new(config.mail.clone(), config.base_url.clone());
        Self {
            config: Arc::new(config),
            pool: pool.clone(),
            tokens,
            users: UserRepository::new(pool.clone()),
            contacts: ContactRepository::new(pool),
            limiter,
            mailer,
        }
    }
}
