//! Application configuration. Read from the environment once at startup
//! into an immutable struct that is passed to the rest of the app; no
//! module reads env vars at request time.

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// SMTP settings for outbound verification mail.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub rate_limit_requests: usize,
    pub rate_limit_window_secs: u64,
    /// Public base URL used to build email confirmation links.
    pub base_url: String,
    pub mail: MailConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env_or("DATABASE_URL", ""),
            jwt_secret: env_or("JWT_SECRET", "default-jwt-secret-change-in-production"),
            access_token_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", 3600),
            refresh_token_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", 604_800),
            rate_limit_requests: env_parse("RATE_LIMIT_REQUESTS", 2),
            rate_limit_window_secs: env_parse("RATE_LIMIT_WINDOW_SECS", 5),
            base_url: env_or("BASE_URL", "http://127.0.0.1:3001"),
            mail: MailConfig {
                server: env_or("MAIL_SERVER", "smtp.meta.ua"),
                port: env_parse("MAIL_PORT", 465),
                username: env_or("MAIL_USERNAME", ""),
                password: env_or("MAIL_PASSWORD", ""),
                from: env_or("MAIL_FROM", "Contacts API <noreply@example.com>"),
            },
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 3001),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_env();
        assert_eq!(config.access_token_ttl_secs, 3600);
        assert_eq!(config.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.rate_limit_requests, 2);
        assert_eq!(config.rate_limit_window_secs, 5);
        assert_eq!(config.mail.port, 465);
        assert!(!config.jwt_secret.is_empty());
    }
}
