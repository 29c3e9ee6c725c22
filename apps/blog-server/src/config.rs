//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use blog_core::query::SearchLanguage;
use blog_infra::JwtConfig;

#[cfg(feature = "postgres")]
use blog_infra::DatabaseConfig;

/// Page sizes and widget lengths for the public listings.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub home_page_size: u64,
    pub tag_page_size: u64,
    pub user_page_size: u64,
    pub similar_posts: u64,
    pub latest_posts: u64,
    pub most_commented_posts: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            home_page_size: 3,
            tag_page_size: 3,
            user_page_size: 4,
            similar_posts: 3,
            latest_posts: 5,
            most_commented_posts: 3,
        }
    }
}

/// Outgoing mail settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Sender address of share mails.
    pub from: String,
    /// When set, mail is POSTed here instead of written to the log.
    pub webhook_url: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "noreply@quill.local".to_string(),
            webhook_url: None,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    pub search_language: SearchLanguage,
    pub listing: ListingConfig,
    pub mail: MailConfig,
    /// Base of links in share mails; the request's own host is used when unset.
    pub public_base_url: Option<String>,
    pub jwt: JwtConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            #[cfg(feature = "postgres")]
            database: None,
            search_language: SearchLanguage::default(),
            listing: ListingConfig::default(),
            mail: MailConfig::default(),
            public_base_url: None,
            jwt: JwtConfig::default(),
        }
    }
}

/// Parse `key`, falling back to `default` when unset or malformed.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, value = %raw, error = %e, "Ignoring malformed setting");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let listing = ListingConfig {
            home_page_size: env_or("HOME_PAGE_SIZE", defaults.listing.home_page_size),
            tag_page_size: env_or("TAG_PAGE_SIZE", defaults.listing.tag_page_size),
            user_page_size: env_or("USER_PAGE_SIZE", defaults.listing.user_page_size),
            similar_posts: env_or("SIMILAR_POSTS", defaults.listing.similar_posts),
            latest_posts: env_or("LATEST_POSTS", defaults.listing.latest_posts),
            most_commented_posts: env_or(
                "MOST_COMMENTED_POSTS",
                defaults.listing.most_commented_posts,
            ),
        };

        let jwt = JwtConfig {
            secret: env_opt("JWT_SECRET").unwrap_or(defaults.jwt.secret),
            expiration_hours: env_or("JWT_EXPIRATION_HOURS", defaults.jwt.expiration_hours),
            issuer: env_opt("JWT_ISSUER").unwrap_or(defaults.jwt.issuer),
        };
        if jwt.uses_default_secret() {
            tracing::warn!("JWT_SECRET not set - using the built-in development secret");
        }

        Self {
            host: env_opt("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            #[cfg(feature = "postgres")]
            database: Self::database_from_env(),
            search_language: env_or("SEARCH_LANGUAGE", defaults.search_language),
            listing,
            mail: MailConfig {
                from: env_opt("MAIL_FROM").unwrap_or(defaults.mail.from),
                webhook_url: env_opt("MAIL_WEBHOOK_URL"),
            },
            public_base_url: env_opt("PUBLIC_BASE_URL"),
            jwt,
        }
    }

    #[cfg(feature = "postgres")]
    fn database_from_env() -> Option<DatabaseConfig> {
        env_opt("DATABASE_URL").map(|url| DatabaseConfig {
            url,
            max_connections: env_or("DB_MAX_CONNECTIONS", 100),
            min_connections: env_or("DB_MIN_CONNECTIONS", 10),
            log_statements: env_or("DB_LOG_STATEMENTS", false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listing_sizes() {
        let config = AppConfig::default();
        assert_eq!(config.listing.home_page_size, 3);
        assert_eq!(config.listing.user_page_size, 4);
        assert_eq!(config.listing.latest_posts, 5);
        assert_eq!(config.search_language, SearchLanguage::English);
        assert!(config.public_base_url.is_none());
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("QUILL_TEST_PAGE_SIZE", "three") };
        assert_eq!(env_or("QUILL_TEST_PAGE_SIZE", 3u64), 3);
        unsafe { env::set_var("QUILL_TEST_PAGE_SIZE", " 7 ") };
        assert_eq!(env_or("QUILL_TEST_PAGE_SIZE", 3u64), 7);
        unsafe { env::remove_var("QUILL_TEST_PAGE_SIZE") };
        assert_eq!(env_or("QUILL_TEST_PAGE_SIZE", 3u64), 3);
    }
}
