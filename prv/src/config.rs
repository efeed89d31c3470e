use crate::batch::BatchOptions;
use crate::cli::{Args, OutputFormat};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid index URL '{url}': {source}")]
    InvalidIndexUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("index URL must use http or https, got '{0}'")]
    UnsupportedScheme(String),
    #[error("--timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("--jobs must be at least 1")]
    ZeroJobs,
}

/// Settings for one run, fixed once built from the command line
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub paths: Vec<PathBuf>,
    pub index_url: Url,
    pub lookup_timeout: Duration,
    pub max_concurrency: usize,
    pub deadline: Option<Duration>,
    pub follow_refs: bool,
    pub format: OutputFormat,
    pub show_colors: bool,
    pub verbosity: u8,
}

impl VerifyConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let index_url = Url::parse(&args.index_url).map_err(|source| ConfigError::InvalidIndexUrl {
            url: args.index_url.clone(),
            source,
        })?;
        if !matches!(index_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(index_url.scheme().to_string()));
        }

        if args.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if args.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }

        Ok(Self {
            paths: args.paths.clone(),
            index_url,
            lookup_timeout: Duration::from_secs(args.timeout),
            max_concurrency: args.jobs,
            deadline: args.deadline.map(Duration::from_secs),
            follow_refs: args.follow_refs,
            format: args.format,
            show_colors: !args.no_color,
            verbosity: args.verbose,
        })
    }

    /// Batch limits; the deadline clock starts now
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            lookup_timeout: self.lookup_timeout,
            max_concurrency: self.max_concurrency,
            deadline: self.deadline.map(|d| tokio::time::Instant::now() + d),
        }
    }
}
