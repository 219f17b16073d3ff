use crate::adapters::http::RetryPolicy;
use crate::app::sequence::{CollectionJob, FailurePolicy};
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const FAILURE_POLICIES: [&str; 2] = ["stop", "continue"];
const MAX_RETRY_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub plex: PlexConfig,
    pub trakt: TraktConfig,
    pub sync: Option<SyncSettings>,
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlexConfig {
    pub url: String,
    pub token: String,
    pub library: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    pub api_key: String,
    pub api_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    pub reindex_per_collection: Option<bool>,
    pub on_collection_failure: Option<String>, // "stop" or "continue"
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub list_url: String,
    pub enabled: Option<bool>,
}

impl CollectionConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

impl SyncConfig {
    /// Loads the configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("plex.url", &self.plex.url)?;
        validation::validate_non_empty_string("plex.token", &self.plex.token)?;
        validation::validate_substituted("plex.token", &self.plex.token)?;
        validation::validate_non_empty_string("plex.library", &self.plex.library)?;

        validation::validate_non_empty_string("trakt.api_key", &self.trakt.api_key)?;
        validation::validate_substituted("trakt.api_key", &self.trakt.api_key)?;
        if let Some(api_url) = &self.trakt.api_url {
            validation::validate_url("trakt.api_url", api_url)?;
        }

        let settings = self.settings();
        if let Some(policy) = &settings.on_collection_failure {
            validation::validate_one_of("sync.on_collection_failure", policy, &FAILURE_POLICIES)?;
        }
        if let Some(attempts) = settings.retry_attempts {
            validation::validate_range("sync.retry_attempts", attempts, 0, MAX_RETRY_ATTEMPTS)?;
        }

        if !self.collections.iter().any(CollectionConfig::is_enabled) {
            return Err(SyncError::MissingConfigError {
                field: "collections".to_string(),
            });
        }
        for collection in &self.collections {
            validation::validate_non_empty_string("collections.name", &collection.name)?;
            validation::validate_url("collections.list_url", &collection.list_url)?;
            crate::adapters::trakt::list_path(&collection.list_url)?;
        }
        validation::validate_unique(
            "collections.name",
            self.collections.iter().map(|c| c.name.as_str()),
        )?;

        Ok(())
    }

    pub fn settings(&self) -> SyncSettings {
        self.sync.clone().unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let settings = self.settings();
        RetryPolicy::new(
            settings.retry_attempts.unwrap_or(defaults.attempts),
            settings
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
        )
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        match self.settings().on_collection_failure.as_deref() {
            Some("continue") => FailurePolicy::Continue,
            _ => FailurePolicy::Stop,
        }
    }

    pub fn reindex_per_collection(&self) -> bool {
        self.settings().reindex_per_collection.unwrap_or(false)
    }

    /// Enabled collections in file order, optionally restricted to `only`.
    pub fn jobs(&self, only: &[String]) -> Result<Vec<CollectionJob>> {
        for name in only {
            if !self.collections.iter().any(|c| &c.name == name) {
                return Err(SyncError::InvalidConfigValueError {
                    field: "collection".to_string(),
                    value: name.clone(),
                    reason: "No collection with this name is configured".to_string(),
                });
            }
        }

        Ok(self
            .collections
            .iter()
            .filter(|c| c.is_enabled())
            .filter(|c| only.is_empty() || only.contains(&c.name))
            .map(|c| CollectionJob::new(c.name.clone(), c.list_url.clone()))
            .collect())
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[plex]
url = "http://localhost:32400"
token = "plex-token"
library = "Movies"

[trakt]
api_key = "trakt-key"

[[collections]]
name = "IMDb Top 250"
list_url = "https://trakt.tv/users/justin/lists/imdb-top-rated-movies"

[[collections]]
name = "Reddit Top 250"
list_url = "https://trakt.tv/users/jay-greene/lists/reddit-top-250-2019-edition"
enabled = false
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = SyncConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.plex.library, "Movies");
        assert_eq!(config.collections.len(), 2);
        assert!(config.validate().is_ok());
        assert_eq!(config.failure_policy(), FailurePolicy::Stop);
        assert!(!config.reindex_per_collection());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_jobs_skip_disabled_and_honor_filter() {
        let config = SyncConfig::from_toml_str(BASIC).unwrap();

        let jobs = config.jobs(&[]).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "IMDb Top 250");

        assert!(config.jobs(&["Reddit Top 250".to_string()]).unwrap().is_empty());
        assert!(config.jobs(&["Unknown".to_string()]).is_err());
    }

    #[test]
    fn test_sync_settings() {
        let content = format!(
            concat!(
                "{}\n[sync]\nreindex_per_collection = true\n",
                "on_collection_failure = \"continue\"\nretry_attempts = 4\nretry_delay_ms = 50\n",
            ),
            BASIC
        );
        let config = SyncConfig::from_toml_str(&content).unwrap();

        assert!(config.validate().is_ok());
        assert!(config.reindex_per_collection());
        assert_eq!(config.failure_policy(), FailurePolicy::Continue);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy::new(4, Duration::from_millis(50))
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COLLECTION_SYNC_TEST_TOKEN", "from-env");

        let content = BASIC.replace("plex-token", "${COLLECTION_SYNC_TEST_TOKEN}");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert_eq!(config.plex.token, "from-env");

        std::env::remove_var("COLLECTION_SYNC_TEST_TOKEN");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let content = BASIC.replace("trakt-key", "${COLLECTION_SYNC_UNSET_VARIABLE}");
        let config = SyncConfig::from_toml_str(&content).unwrap();

        assert_eq!(config.trakt.api_key, "${COLLECTION_SYNC_UNSET_VARIABLE}");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_errors() {
        let bad_url = BASIC.replace("http://localhost:32400", "localhost");
        assert!(SyncConfig::from_toml_str(&bad_url).unwrap().validate().is_err());

        let bad_list = BASIC.replace(
            "https://trakt.tv/users/justin/lists/imdb-top-rated-movies",
            "https://trakt.tv/movies/popular",
        );
        assert!(SyncConfig::from_toml_str(&bad_list).unwrap().validate().is_err());

        let duplicate = BASIC.replace("Reddit Top 250", "IMDb Top 250");
        assert!(SyncConfig::from_toml_str(&duplicate).unwrap().validate().is_err());

        let bad_policy = format!("{}\n[sync]\non_collection_failure = \"retry\"\n", BASIC);
        assert!(SyncConfig::from_toml_str(&bad_policy).unwrap().validate().is_err());

        let all_disabled = BASIC.replace(
            "list_url = \"https://trakt.tv/users/justin/lists/imdb-top-rated-movies\"",
            concat!(
                "list_url = \"https://trakt.tv/users/justin/lists/imdb-top-rated-movies\"\n",
                "enabled = false",
            ),
        );
        assert!(matches!(
            SyncConfig::from_toml_str(&all_disabled).unwrap().validate(),
            Err(SyncError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = SyncConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.trakt.api_key, "trakt-key");
    }

    #[test]
    fn test_missing_section_is_a_parse_error() {
        let result = SyncConfig::from_toml_str("[plex]\nurl = \"http://localhost:32400\"\n");
        assert!(matches!(
            result,
            Err(SyncError::ConfigValidationError { .. })
        ));
    }
}
