use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use reelsmith_core::task_state::TASK_RETENTION_SECS;
use reelsmith_events::delivery::callback::DEFAULT_USER_AGENT;
use reelsmith_pipeline::{CaptionModel, PipelineConfig};

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Base URL of the remote job service.
    pub remote_api_url: String,
    /// Number of runs executing at once.
    pub max_concurrent_tasks: usize,
    /// How often an idle worker checks the queue.
    pub queue_poll_interval: Duration,
    pub callback_timeout: Duration,
    pub callback_user_agent: String,
    /// How long task records outlive their last update.
    pub task_retention: Duration,
    /// How often expired task records are deleted.
    pub purge_interval: Duration,
    pub pipeline: PipelineConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `DATABASE_URL`           | required                 |
    /// | `REMOTE_API_URL`         | `http://localhost:8080`  |
    /// | `MAX_CONCURRENT_TASKS`   | `10`                     |
    /// | `TASK_TIMEOUT_SECS`      | `1200`                   |
    /// | `POLL_INTERVAL_SECS`     | `5`                      |
    /// | `QUEUE_POLL_INTERVAL_MS` | `1000`                   |
    /// | `CALLBACK_TIMEOUT_SECS`  | `30`                     |
    /// | `CALLBACK_USER_AGENT`    | `reelsmith-worker/<ver>` |
    /// | `TASK_RETENTION_SECS`    | `3600`                   |
    /// | `PURGE_INTERVAL_SECS`    | `300`                    |
    /// | `CAPTION_MODEL`          | `small`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = env
            .get("DATABASE_URL")
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let remote_api_url = env
            .get("REMOTE_API_URL")
            .unwrap_or_else(|| "http://localhost:8080".into());

        let max_concurrent_tasks = env.parse_nonzero("MAX_CONCURRENT_TASKS", 10)?;

        let mut pipeline = PipelineConfig {
            run_deadline: Duration::from_secs(env.parse("TASK_TIMEOUT_SECS", 1200)?),
            poll_interval: Duration::from_secs(env.parse("POLL_INTERVAL_SECS", 5)?),
            ..PipelineConfig::default()
        };
        if let Some(raw) = env.get("CAPTION_MODEL") {
            pipeline.caption_model = raw.parse::<CaptionModel>().map_err(|reason| {
                ConfigError::Invalid {
                    var: "CAPTION_MODEL",
                    value: raw.clone(),
                    reason,
                }
            })?;
        }

        Ok(Self {
            database_url,
            remote_api_url,
            max_concurrent_tasks,
            queue_poll_interval: Duration::from_millis(env.parse_nonzero("QUEUE_POLL_INTERVAL_MS", 1000)?),
            callback_timeout: Duration::from_secs(env.parse("CALLBACK_TIMEOUT_SECS", 30)?),
            callback_user_agent: env
                .get("CALLBACK_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            task_retention: Duration::from_secs(env.parse("TASK_RETENTION_SECS", TASK_RETENTION_SECS)?),
            purge_interval: Duration::from_secs(env.parse_nonzero("PURGE_INTERVAL_SECS", 300)?),
            pipeline,
        })
    }
}

/// Variable lookup with blank values treated as unset.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var: name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Like [`Env::parse`] but rejects zero.
    fn parse_nonzero<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq + Display,
        T::Err: Display,
    {
        let value = self.parse(name, default)?;
        if value == T::default() {
            return Err(ConfigError::Invalid {
                var: name,
                value: value.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(value)
    }
}
