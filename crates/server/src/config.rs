use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    env,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// The environment variable naming the configuration file.
pub const GEOAPI_CONFIG: &str = "GEOAPI_CONFIG";

/// The environment variable naming the OpenAPI document file.
pub const GEOAPI_OPENAPI: &str = "GEOAPI_OPENAPI";

/// The environment variable naming the home directory.
pub const GEOAPI_HOME: &str = "GEOAPI_HOME";

const DEFAULT_STATIC_DIR: &str = "static";

/// The adapter configuration.
///
/// Only the `server` section is typed; every other section belongs to the
/// API library and is carried through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// The server section.
    #[serde(default)]
    pub server: ServerConfig,

    /// All other sections, opaque to the adapter.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `server` section of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// The bind address.
    pub bind: Bind,

    /// The public url of the server, if it differs from the bind address.
    pub url: Option<String>,

    /// Template and static-file locations.
    pub templates: Option<Templates>,
}

/// A bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bind {
    /// The host to bind to.
    pub host: String,

    /// The port to bind to.
    pub port: u16,
}

/// Template and static-file locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Templates {
    /// The template directory.
    pub path: Option<PathBuf>,

    /// The static-file directory.
    #[serde(rename = "static")]
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration from the file named by [GEOAPI_CONFIG].
    pub fn from_env() -> Result<Config> {
        let path = env::var(GEOAPI_CONFIG).map_err(|_| Error::MissingEnv(GEOAPI_CONFIG))?;
        Config::from_path(path)
    }

    /// Loads the configuration from a file.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use geoapi_server::Config;
    ///
    /// let config = Config::from_path("geoapi-config.json").unwrap();
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Result<Config> {
        let file = File::open(path)?;
        serde_json::from_reader(BufReader::new(file)).map_err(Error::from)
    }

    /// Returns the static-file directory, `static` by default.
    pub fn static_dir(&self) -> PathBuf {
        self.server
            .templates
            .as_ref()
            .and_then(|templates| templates.static_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR))
    }

    /// Returns the address to bind a server to, e.g. `0.0.0.0:5000`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind.host, self.server.bind.port)
    }
}

impl Default for ServerConfig {
    fn default() -> ServerConfig {
        ServerConfig {
            bind: Bind::default(),
            url: None,
            templates: None,
        }
    }
}

impl Default for Bind {
    fn default() -> Bind {
        Bind {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Loads the OpenAPI document from the file named by [GEOAPI_OPENAPI].
///
/// The document is handed to the API library as-is; this crate does not
/// interpret it.
pub fn load_openapi_document() -> Result<Value> {
    let path = env::var(GEOAPI_OPENAPI).map_err(|_| Error::MissingEnv(GEOAPI_OPENAPI))?;
    openapi_from_path(path)
}

/// Loads an OpenAPI document from a file.
pub fn openapi_from_path(path: impl AsRef<Path>) -> Result<Value> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(Error::from)
}
