//! Client configuration.
//!
//! Loaded from a TOML file or built from defaults. Every field is optional
//! in the file:
//!
//! ```toml
//! endpoint = "https://siapla.example/graphql"
//! navigation_capacity = 20
//! booking_fallback_days = 7
//!
//! [default_availability]
//! mo = 8.0
//! tu = 8.0
//! we = 8.0
//! th = 8.0
//! fr = 6.0
//! sa = 0.0
//! su = 0.0
//! ```

use std::path::Path;

use chrono::Duration;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};
use crate::models::Availability;
use crate::navigation::DEFAULT_CAPACITY;

/// Environment variable overriding [`ClientConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "GRAPHQL_URI";

/// Upper bound for [`ClientConfig::navigation_capacity`].
pub const MAX_NAVIGATION_CAPACITY: usize = 1_000;

/// Upper bound for [`ClientConfig::booking_fallback_days`].
pub const MAX_BOOKING_FALLBACK_DAYS: i64 = 3_650;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Absolute GraphQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Weekly hours assumed for weekdays a resource does not report
    #[serde(default = "default_availability")]
    pub default_availability: Option<Availability>,

    /// Maximum number of side-panel history entries
    #[serde(default = "default_navigation_capacity")]
    pub navigation_capacity: usize,

    /// Length of a booking drafted for a task without plan allocations
    #[serde(default = "default_booking_fallback_days")]
    pub booking_fallback_days: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_availability: default_availability(),
            navigation_capacity: default_navigation_capacity(),
            booking_fallback_days: default_booking_fallback_days(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8880/graphql".to_string()
}

fn default_availability() -> Option<Availability> {
    Some(Availability::standard_week())
}

fn default_navigation_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_booking_fallback_days() -> i64 {
    7
}

impl ClientConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Defaults with the endpoint taken from `GRAPHQL_URI`, if set.
    pub fn from_env() -> Self {
        Self::default().with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies environment-style overrides using `lookup`.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_default_availability(mut self, availability: Option<Availability>) -> Self {
        self.default_availability = availability;
        self
    }

    pub fn with_navigation_capacity(mut self, capacity: usize) -> Self {
        self.navigation_capacity = capacity;
        self
    }

    pub fn with_booking_fallback_days(mut self, days: i64) -> Self {
        self.booking_fallback_days = days;
        self
    }

    /// Fallback booking length as a duration, clamped to the accepted range.
    pub fn booking_fallback(&self) -> Duration {
        let days = self
            .booking_fallback_days
            .clamp(0, MAX_BOOKING_FALLBACK_DAYS);
        Duration::try_days(days).unwrap_or_else(Duration::zero)
    }

    /// Rejects values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if let Err(err) = Url::parse(self.endpoint.trim()) {
            return Err(ClientError::InvalidArgument(format!(
                "endpoint must be an absolute URL, got {:?}: {err}",
                self.endpoint
            )));
        }
        if !(1..=MAX_NAVIGATION_CAPACITY).contains(&self.navigation_capacity) {
            return Err(ClientError::InvalidArgument(format!(
                "navigation_capacity must be within 1..={MAX_NAVIGATION_CAPACITY}, got {}",
                self.navigation_capacity
            )));
        }
        if !(0..=MAX_BOOKING_FALLBACK_DAYS).contains(&self.booking_fallback_days) {
            return Err(ClientError::InvalidArgument(format!(
                "booking_fallback_days must be within 0..={MAX_BOOKING_FALLBACK_DAYS}, got {}",
                self.booking_fallback_days
            )));
        }
        Ok(())
    }
}
