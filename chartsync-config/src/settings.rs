use std::time::Duration;

/// Recognized environment variables.
const ENV_CLIENT_ID: &str = "CLIENT_ID";
const ENV_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
const ENV_TMDB_API_KEY: &str = "TMDB_API_KEY";
const ENV_KIDS_LIST: &str = "KIDS_LIST";
const ENV_PRINT_LISTS: &str = "PRINT_LISTS";
const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";
const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
const ENV_BACKOFF_FACTOR: &str = "BACKOFF_FACTOR";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_RETRIES: u32 = 10;
const DEFAULT_BACKOFF_FACTOR: u32 = 2;

/// Runtime configuration.
///
/// Destination credentials (`CLIENT_ID` / `ACCESS_TOKEN`) are required to
/// sync; the catalog key (`TMDB_API_KEY`) is optional and its absence
/// disables entity resolution rather than failing the run.
#[derive(Debug, Clone)]
pub struct Config {
    pub trakt_client_id: Option<String>,
    pub trakt_access_token: Option<String>,
    pub tmdb_api_key: Option<String>,
    /// Process the supplementary kids chart sections.
    pub kids_lists: bool,
    /// Dump every resolved section table before updating lists.
    pub print_lists: bool,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub backoff_factor: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trakt_client_id: None,
            trakt_access_token: None,
            tmdb_api_key: None,
            kids_lists: false,
            print_lists: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read the environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            trakt_client_id: non_empty(env_var(ENV_CLIENT_ID)),
            trakt_access_token: non_empty(env_var(ENV_ACCESS_TOKEN)),
            tmdb_api_key: non_empty(env_var(ENV_TMDB_API_KEY)),
            kids_lists: parse_bool(env_var(ENV_KIDS_LIST).as_deref()),
            print_lists: parse_bool(env_var(ENV_PRINT_LISTS).as_deref()),
            request_timeout: parse_secs(
                env_var(ENV_REQUEST_TIMEOUT).as_deref(),
                defaults.request_timeout,
            ),
            max_retries: parse_u32(env_var(ENV_MAX_RETRIES).as_deref(), defaults.max_retries),
            backoff_factor: parse_u32(
                env_var(ENV_BACKOFF_FACTOR).as_deref(),
                defaults.backoff_factor,
            ),
        }
    }

    /// Both destination credentials, when configured.
    pub fn trakt_credentials(&self) -> Option<(&str, &str)> {
        match (&self.trakt_client_id, &self.trakt_access_token) {
            (Some(client_id), Some(token)) => Some((client_id, token)),
            _ => None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn parse_u32(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_secs(value: Option<&str>, default: Duration) -> Duration {
    value
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = Config::default();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.backoff_factor, 2);
        assert!(!config.kids_lists);
        assert!(!config.print_lists);
        assert!(config.trakt_credentials().is_none());
    }

    #[test]
    fn test_parse_bool_accepts_true_case_insensitively() {
        assert!(parse_bool(Some("true")));
        assert!(parse_bool(Some("True")));
        assert!(parse_bool(Some(" TRUE ")));
        assert!(!parse_bool(Some("false")));
        assert!(!parse_bool(Some("1")));
        assert!(!parse_bool(Some("")));
        assert!(!parse_bool(None));
    }

    #[test]
    fn test_numeric_overrides_fall_back_on_garbage() {
        assert_eq!(parse_u32(Some("5"), 10), 5);
        assert_eq!(parse_u32(Some("five"), 10), 10);
        assert_eq!(parse_secs(Some("60"), Duration::from_secs(30)), Duration::from_secs(60));
        assert_eq!(
            parse_secs(Some("soon"), Duration::from_secs(30)),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_credentials_require_both_halves() {
        let config = Config {
            trakt_client_id: Some("id".to_string()),
            ..Config::default()
        };
        assert!(config.trakt_credentials().is_none());

        let config = Config {
            trakt_client_id: Some("id".to_string()),
            trakt_access_token: Some("token".to_string()),
            ..Config::default()
        };
        assert_eq!(config.trakt_credentials(), Some(("id", "token")));
    }
}
