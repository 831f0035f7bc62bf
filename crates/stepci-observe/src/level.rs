use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::{LoggerError, LoggerResult};

/// Validated `EnvFilter` directive, e.g. `info` or `stepci_core=debug,info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// Validate a directive.
    ///
    /// # Examples
    /// ```
    /// use stepci_observe::LoggerLevel;
    ///
    /// let lvl = LoggerLevel::new("stepci_core=debug,info").unwrap();
    /// assert_eq!(lvl.as_str(), "stepci_core=debug,info");
    /// ```
    pub fn new(s: impl Into<String>) -> LoggerResult<Self> {
        Self::try_from(s.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the filter described by this directive.
    ///
    /// # Examples
    /// ```
    /// use stepci_observe::LoggerLevel;
    ///
    /// let lvl = "warn".parse::<LoggerLevel>().unwrap();
    /// assert!(lvl.to_env_filter().is_ok());
    /// ```
    pub fn to_env_filter(&self) -> LoggerResult<EnvFilter> {
        parse(&self.0)
    }
}

fn parse(directive: &str) -> LoggerResult<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| LoggerError::InvalidLevel(format!("{directive}: {e}")))
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse(&s)?;
        Ok(Self(s))
    }
}

impl From<LoggerLevel> for String {
    fn from(level: LoggerLevel) -> Self {
        level.0
    }
}
