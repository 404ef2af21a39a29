use std::{
	num::{NonZeroU64, NonZeroUsize},
	str::FromStr,
	time::Duration,
};

use axum::http::HeaderValue;

use crate::ratelimit::Limits;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
}

/// Runtime configuration, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: String,
	pub port: u16,
	/// When unset, an in-memory store is used.
	pub database_url: Option<String>,
	/// Accounts registered with one of these emails become admins.
	pub admin_emails: Vec<String>,
	/// Allowed CORS origins. Empty allows any origin.
	pub cors_origins: Vec<HeaderValue>,
	pub signup_enabled: bool,
	/// Seed new posts with cosmetic interaction counters.
	pub seed_interactions: bool,
	pub rate_limit: Limits,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".into(),
			port: 3000,
			database_url: None,
			admin_emails: Vec::new(),
			cors_origins: Vec::new(),
			signup_enabled: true,
			seed_interactions: false,
			rate_limit: Limits::default(),
		}
	}
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let defaults = Self::default();
		let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

		let cors_origins = list(var("CORS_ORIGINS"))
			.into_iter()
			.map(|origin| {
				HeaderValue::from_str(&origin).map_err(|_| Error::Invalid {
					name: "CORS_ORIGINS",
					value: origin,
				})
			})
			.collect::<Result<_, _>>()?;

		Ok(Self {
			host: var("HOST").unwrap_or(defaults.host),
			port: parse("PORT", var("PORT"))?.unwrap_or(defaults.port),
			database_url: var("DATABASE_URL"),
			admin_emails: list(var("ADMIN_EMAILS"))
				.into_iter()
				.map(|email| email.to_lowercase())
				.collect(),
			cors_origins,
			signup_enabled: flag("SIGNUP_ENABLED", var("SIGNUP_ENABLED"))?
				.unwrap_or(defaults.signup_enabled),
			seed_interactions: flag("SEED_INTERACTIONS", var("SEED_INTERACTIONS"))?
				.unwrap_or(defaults.seed_interactions),
			rate_limit: Limits {
				capacity: parse::<NonZeroUsize>("RATE_LIMIT_CAPACITY", var("RATE_LIMIT_CAPACITY"))?
					.unwrap_or(defaults.rate_limit.capacity),
				window: parse::<NonZeroU64>("RATE_LIMIT_WINDOW_SECS", var("RATE_LIMIT_WINDOW_SECS"))?
					.map_or(defaults.rate_limit.window, |secs| {
						Duration::from_secs(secs.get())
					}),
			},
		})
	}

	pub fn is_admin_email(&self, email: &str) -> bool {
		self.admin_emails
			.iter()
			.any(|admin| admin.eq_ignore_ascii_case(email))
	}
}

fn list(value: Option<String>) -> Vec<String> {
	value
		.map(|value| {
			value
				.split(',')
				.map(str::trim)
				.filter(|item| !item.is_empty())
				.map(str::to_owned)
				.collect()
		})
		.unwrap_or_default()
}

fn parse<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>, Error> {
	value
		.map(|value| {
			value
				.trim()
				.parse()
				.map_err(|_| Error::Invalid { name, value })
		})
		.transpose()
}

fn flag(name: &'static str, value: Option<String>) -> Result<Option<bool>, Error> {
	value
		.map(|value| match value.trim().to_ascii_lowercase().as_str() {
			"true" | "1" | "yes" | "on" => Ok(true),
			"false" | "0" | "no" | "off" => Ok(false),
			_ => Err(Error::Invalid { name, value }),
		})
		.transpose()
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::*;

	fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
		let vars: HashMap<String, String> = vars
			.iter()
			.map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
			.collect();

		Config::from_lookup(|name| vars.get(name).cloned())
	}

	#[test]
	fn test_defaults() {
		let config = config(&[]).unwrap();

		assert_eq!(config.port, 3000);
		assert!(config.database_url.is_none());
		assert!(config.signup_enabled);
		assert!(!config.seed_interactions);
		assert_eq!(config.rate_limit.capacity.get(), 500);
		assert_eq!(config.rate_limit.window, Duration::from_secs(60));
	}

	#[test]
	fn test_values() {
		let config = config(&[
			("PORT", "8080"),
			("ADMIN_EMAILS", "Admin@Example.com, ops@example.com"),
			("SIGNUP_ENABLED", "false"),
			("RATE_LIMIT_WINDOW_SECS", "10"),
			("CORS_ORIGINS", "https://blog.example.com"),
		])
		.unwrap();

		assert_eq!(config.port, 8080);
		assert!(config.is_admin_email("admin@example.com"));
		assert!(config.is_admin_email("OPS@example.com"));
		assert!(!config.is_admin_email("someone@example.com"));
		assert!(!config.signup_enabled);
		assert_eq!(config.rate_limit.window, Duration::from_secs(10));
		assert_eq!(config.cors_origins.len(), 1);
	}

	#[test]
	fn test_malformed_values() {
		assert!(config(&[("PORT", "eighty")]).is_err());
		assert!(config(&[("SIGNUP_ENABLED", "maybe")]).is_err());
		assert!(config(&[("RATE_LIMIT_CAPACITY", "0")]).is_err());
	}
}
