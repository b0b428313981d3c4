// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server configuration, layered from `TALLY_SERVER_*` environment
//! variables over defaults.

/// Configuration for the tally-server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	/// Bind host.
	pub host: String,
	/// Bind port.
	pub port: u16,
	/// SQLite database URL.
	pub database_url: String,
	/// Default log filter when `RUST_LOG` is unset.
	pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid TALLY_SERVER_PORT: {0}")]
	InvalidPort(String),
}

impl ServerConfig {
	/// The address to bind, as `host:port`.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// Load configuration from the environment.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	let host = std::env::var("TALLY_SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

	let port = match std::env::var("TALLY_SERVER_PORT") {
		Ok(raw) => raw
			.parse::<u16>()
			.map_err(|_| ConfigError::InvalidPort(raw))?,
		Err(_) => 8080,
	};

	let database_url = std::env::var("TALLY_SERVER_DATABASE_URL")
		.unwrap_or_else(|_| "sqlite://tally.db?mode=rwc".to_string());

	let log_level = std::env::var("TALLY_SERVER_LOG").unwrap_or_else(|_| "info".to_string());

	Ok(ServerConfig {
		host,
		port,
		database_url,
		log_level,
	})
}
