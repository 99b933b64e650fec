//! Environment-driven configuration.
//!
//! Variables follow the hosted-runner convention: each one is read as
//! `INPUT_<NAME>` unless `LOCAL_DEV` is set, in which case the bare name
//! is used. `.env` files are loaded by `main` before this module runs.

use std::env;

use thiserror::Error;

/// Default pivot-field name when `PIVOT_FIELD` is not set.
pub const DEFAULT_PIVOT_FIELD: &str = "Status";

/// Configuration problems that abort a run before any side effects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    /// Both sink credential sets are present.
    #[error("both Slack API (SLACK_TOKEN & CHANNEL) and Slack incoming webhook (SLACK_WEBHOOK) are configured; update the configuration to use only one")]
    AmbiguousSink,
    /// Neither sink credential set is present.
    #[error("missing Slack configuration; provide SLACK_TOKEN & CHANNEL to use the Slack API, or SLACK_WEBHOOK to use an incoming webhook")]
    MissingSink,
    /// The configured pivot field does not exist on the board.
    #[error("no {name:?} field found on the board")]
    PivotFieldMissing {
        /// The configured pivot-field name.
        name: String,
    },
    /// The configured pivot field has no enumerable option set.
    #[error("field {name:?} is not single-select; the pivot field must have an option set")]
    PivotFieldNotSelect {
        /// The configured pivot-field name.
        name: String,
    },
}

/// Which messaging sink variant the credentials select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// Slack Web API: bot token plus channel id.
    Api {
        /// Bot token.
        token: String,
        /// Channel id (required for message updates).
        channel: String,
    },
    /// Slack incoming webhook; post-only.
    Webhook {
        /// Webhook URL.
        url: String,
    },
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Browser URL of the board to watch.
    pub project_url: String,
    /// Name of the single-select field that buckets items into columns.
    pub pivot_field: String,
    /// Label allow-list for comment tracking; empty means no filtering.
    pub labels: Vec<String>,
    /// Whether to mirror issue comments into the sink.
    pub track_comments: bool,
    /// Selected messaging sink credentials.
    pub sink: SinkConfig,
    /// Provider API token.
    pub provider_token: String,
    /// `owner/name` of the repository holding persisted snapshots.
    pub data_repo: String,
}

impl Config {
    /// Reads and validates configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the sink
    /// credentials are ambiguous.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let local_dev = lookup("LOCAL_DEV").is_some();
        let get = |name: &str| -> Option<String> {
            let resolved =
                if local_dev { name.to_string() } else { format!("INPUT_{name}") };
            lookup(&resolved).filter(|value| !value.is_empty())
        };

        let use_api = get("SLACK_TOKEN").is_some() && get("CHANNEL").is_some();
        let use_webhook = get("SLACK_WEBHOOK").is_some();
        let sink = match (use_api, use_webhook) {
            (true, true) => return Err(ConfigError::AmbiguousSink),
            (false, false) => return Err(ConfigError::MissingSink),
            (true, false) => SinkConfig::Api {
                token: get("SLACK_TOKEN").unwrap_or_default(),
                channel: get("CHANNEL").unwrap_or_default(),
            },
            (false, true) => SinkConfig::Webhook { url: get("SLACK_WEBHOOK").unwrap_or_default() },
        };

        let labels = get("LABELS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let track_comments =
            get("TRACK_ISSUES").is_some_and(|value| value.eq_ignore_ascii_case("true"));

        // The fallback token is always read under its bare name; it is the
        // ambient credential of the hosting environment, not an input.
        let provider_token = get("PAT")
            .or_else(|| lookup("GITHUB_SCRIPT_TOKEN").filter(|value| !value.is_empty()))
            .ok_or(ConfigError::MissingVar("PAT"))?;

        Ok(Self {
            project_url: get("PROJECT_URL").ok_or(ConfigError::MissingVar("PROJECT_URL"))?,
            pivot_field: get("PIVOT_FIELD").unwrap_or_else(|| DEFAULT_PIVOT_FIELD.to_string()),
            labels,
            track_comments,
            sink,
            provider_token,
            data_repo: get("REPO_FOR_DATA").ok_or(ConfigError::MissingVar("REPO_FOR_DATA"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("LOCAL_DEV".to_string(), "1".to_string());
        env.insert("PROJECT_URL".to_string(), "https://github.com/orgs/acme/projects/7".to_string());
        env.insert("REPO_FOR_DATA".to_string(), "acme/board-data".to_string());
        env.insert("PAT".to_string(), "token".to_string());
        env.insert("SLACK_WEBHOOK".to_string(), "https://hooks.slack.example/T123".to_string());
        env
    }

    fn config_from(env: &HashMap<String, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn webhook_only_selects_webhook_sink() {
        let config = config_from(&base_env()).unwrap();
        assert!(matches!(config.sink, SinkConfig::Webhook { .. }));
        assert_eq!(config.pivot_field, "Status");
        assert!(config.labels.is_empty());
        assert!(!config.track_comments);
    }

    #[test]
    fn token_and_channel_select_api_sink() {
        let mut env = base_env();
        env.remove("SLACK_WEBHOOK");
        env.insert("SLACK_TOKEN".to_string(), "xoxb-1".to_string());
        env.insert("CHANNEL".to_string(), "C012345".to_string());
        let config = config_from(&env).unwrap();
        assert!(matches!(config.sink, SinkConfig::Api { .. }));
    }

    #[test]
    fn both_credential_sets_are_rejected() {
        let mut env = base_env();
        env.insert("SLACK_TOKEN".to_string(), "xoxb-1".to_string());
        env.insert("CHANNEL".to_string(), "C012345".to_string());
        assert!(matches!(config_from(&env), Err(ConfigError::AmbiguousSink)));
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut env = base_env();
        env.remove("SLACK_WEBHOOK");
        assert!(matches!(config_from(&env), Err(ConfigError::MissingSink)));
    }

    #[test]
    fn token_without_channel_does_not_count_as_api_config() {
        let mut env = base_env();
        env.insert("SLACK_TOKEN".to_string(), "xoxb-1".to_string());
        // Webhook still configured, so this stays unambiguous.
        let config = config_from(&env).unwrap();
        assert!(matches!(config.sink, SinkConfig::Webhook { .. }));
    }

    #[test]
    fn labels_are_split_and_trimmed() {
        let mut env = base_env();
        env.insert("LABELS".to_string(), "bug, p1 ,".to_string());
        let config = config_from(&env).unwrap();
        assert_eq!(config.labels, vec!["bug", "p1"]);
    }

    #[test]
    fn empty_labels_mean_no_filtering() {
        let mut env = base_env();
        env.insert("LABELS".to_string(), String::new());
        let config = config_from(&env).unwrap();
        assert!(config.labels.is_empty());
    }

    #[test]
    fn track_issues_flag_is_case_insensitive() {
        let mut env = base_env();
        env.insert("TRACK_ISSUES".to_string(), "True".to_string());
        assert!(config_from(&env).unwrap().track_comments);
    }

    #[test]
    fn input_prefix_applies_without_local_dev() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("INPUT_PROJECT_URL".to_string(), "https://github.com/orgs/a/projects/1".to_string());
        env.insert("INPUT_REPO_FOR_DATA".to_string(), "a/data".to_string());
        env.insert("INPUT_PAT".to_string(), "token".to_string());
        env.insert("INPUT_SLACK_WEBHOOK".to_string(), "https://hooks.slack.example/T1".to_string());
        let config = config_from(&env).unwrap();
        assert_eq!(config.data_repo, "a/data");
    }

    #[test]
    fn script_token_is_the_pat_fallback() {
        let mut env = base_env();
        env.remove("PAT");
        env.insert("GITHUB_SCRIPT_TOKEN".to_string(), "ambient".to_string());
        let config = config_from(&env).unwrap();
        assert_eq!(config.provider_token, "ambient");
    }

    #[test]
    fn missing_project_url_is_an_error() {
        let mut env = base_env();
        env.remove("PROJECT_URL");
        assert!(matches!(config_from(&env), Err(ConfigError::MissingVar("PROJECT_URL"))));
    }
}
