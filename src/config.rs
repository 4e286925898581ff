//! Configuration loading.
//!
//! Values come from (highest precedence first):
//! 1. Environment variables prefixed with `XPECTRUM_` (nested with `__`)
//! 2. TOML file, by default `~/.config/xpectrum/config.toml`
//! 3. Built-in defaults matching the production API

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = "xpectrum";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub pdf: PdfConfig,
}

/// Remote API endpoints and timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub flights_path: String,
    pub passengers_path: String,
    /// The production app reads tickets from the passengers endpoint.
    pub ticket_path: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Where boarding passes are written. Defaults to the downloads directory.
    pub output_dir: Option<PathBuf>,
    /// Logo file path or URL. Unset means the logo built into the binary.
    pub logo: Option<String>,
    /// Connect and read timeout when the logo is fetched from a URL.
    pub logo_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.apiswagger.somee.com".to_string(),
            flights_path: "/api/vuelos/getvuelos".to_string(),
            passengers_path: "/api/vuelos/ObtenerPasajerosPorCodigoVuelo".to_string(),
            ticket_path: "/api/vuelos/ObtenerPasajerosPorCodigoVuelo".to_string(),
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
        }
    }
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            logo: None,
            logo_timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl PdfConfig {
    pub fn logo_timeout(&self) -> Duration {
        Duration::from_millis(self.logo_timeout_ms)
    }

    /// Configured directory, else the user's downloads folder, else `.`.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Config {
    /// Load configuration, reading the TOML file at `config_path` if given.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("XPECTRUM_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty base URL or a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".to_string()));
        }
        if self.api.connect_timeout_ms == 0 || self.api.read_timeout_ms == 0 {
            return Err(Error::Config("api timeouts must be greater than zero".to_string()));
        }
        if self.pdf.logo_timeout_ms == 0 {
            return Err(Error::Config("pdf.logo_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}
