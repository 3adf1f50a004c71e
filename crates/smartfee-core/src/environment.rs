//! Fee service deployments.
//!
//! The environment is always passed explicitly into the top-level operation;
//! [`Environment::default`] only picks staging for callers that do not care.

use std::fmt;
use std::str::FromStr;

use crate::constants::{PRODUCTION_URL, STAGING_URL};
use crate::error::SmartFeeError;

/// A named fee service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Environment {
    name: String,
    url: String,
}

impl Environment {
    /// The staging deployment.
    pub fn staging() -> Self {
        Self::custom("staging", STAGING_URL)
    }

    /// The production deployment.
    pub fn production() -> Self {
        Self::custom("production", PRODUCTION_URL)
    }

    /// Any other deployment, e.g. a local fake in tests.
    ///
    /// A trailing `/` on `url` is dropped so endpoint paths join cleanly.
    pub fn custom(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    /// Environment name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL, without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Absolute URL of an endpoint path such as `/bumper/fee`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::staging()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

impl FromStr for Environment {
    type Err = SmartFeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "staging" => Ok(Self::staging()),
            "production" => Ok(Self::production()),
            other => Err(SmartFeeError::Configuration(format!(
                "unknown environment {other:?} (must be 'staging' or 'production')"
            ))),
        }
    }
}
