//! Server configuration.
//!
//! The entire external configuration surface is the command line:
//! `skiffd <port> <password>`.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("expected exactly two arguments: <port> <password>")]
    WrongArgCount,
    #[error("invalid port {0:?}: must be an integer in [1024, 2147483647]")]
    InvalidPort(String),
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port. Validated to lie in `[1024, i32::MAX]`; values beyond
    /// the 16-bit port space wrap when binding.
    pub port: i32,
    /// Shared connection password checked by PASS.
    pub password: String,
}

impl Config {
    /// Parse the argument list (without the program name).
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let [port, password] = args.as_slice() else {
            return Err(ConfigError::WrongArgCount);
        };

        let port: i32 = port
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        if port < 1024 {
            return Err(ConfigError::InvalidPort(port.to_string()));
        }

        Ok(Self {
            port,
            password: password.clone(),
        })
    }

    /// The 16-bit port actually bound.
    pub fn listen_port(&self) -> u16 {
        self.port as u16
    }
}
