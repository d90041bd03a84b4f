use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl RunMode {
    /// `production` (any case) selects production; everything else is development.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_api_base() -> String {
    "http://127.0.0.1:8000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "default_api_base")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
        }
    }
}

fn default_idle_ms() -> u64 {
    150
}

fn default_frame_ms() -> u64 {
    16
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Quiet period after the last scroll before the tracker goes inactive.
    #[serde(default = "default_idle_ms")]
    pub idle_ms: u64,
    /// Coalescing window for scroll recomputation.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            idle_ms: default_idle_ms(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl ScrollConfig {
    pub fn idle_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.idle_ms)
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frame_ms)
    }
}

fn default_loader_ms() -> u64 {
    1200
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransitionConfig {
    #[serde(default = "default_loader_ms")]
    pub loader_ms: u64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            loader_ms: default_loader_ms(),
        }
    }
}

fn default_lerp() -> f64 {
    0.1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmoothScrollConfig {
    #[serde(default = "default_lerp")]
    pub lerp: f64,
}

impl Default for SmoothScrollConfig {
    fn default() -> Self {
        Self {
            lerp: default_lerp(),
        }
    }
}

fn default_status_interval() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusConfig {
    #[serde(default = "default_status_interval")]
    pub interval_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_status_interval(),
        }
    }
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("public")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetsConfig {
    /// Directory holding `sounds/` and other static files.
    #[serde(default = "default_assets_dir")]
    pub dir: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
        }
    }
}

pub const DEFAULT_IMAGE_DOMAINS: &[&str] = &[
    "www.noburestaurants.com",
    "www.elevenmadisonpark.com",
    "static01.nyt.com",
    "www.quincerestaurant.com",
    "cdn.vox-cdn.com",
    "media.cntraveler.com",
    "media-cdn.tripadvisor.com",
    "example.com",
];

fn default_image_domains() -> Vec<String> {
    DEFAULT_IMAGE_DOMAINS.iter().map(|d| d.to_string()).collect()
}

fn default_image_max_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImagesConfig {
    /// Remote hosts images may be loaded from. Exact host match, also
    /// applied to every redirect hop.
    #[serde(default = "default_image_domains")]
    pub domains: Vec<String>,
    /// Largest upstream image body the proxy will relay.
    #[serde(default = "default_image_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            domains: default_image_domains(),
            max_bytes: default_image_max_bytes(),
        }
    }
}

impl ImagesConfig {
    pub fn allows_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| d.eq_ignore_ascii_case(host))
    }

    /// Whether `raw` is an http(s) URL whose host is on the allow-list.
    pub fn allows_url(&self, raw: &str) -> bool {
        match url::Url::parse(raw) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "http" | "https")
                    && parsed.host_str().is_some_and(|h| self.allows_host(h))
            }
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub transition: TransitionConfig,
    #[serde(default)]
    pub smooth_scroll: SmoothScrollConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

impl AppConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Load the file, then apply process environment overrides and validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORT`, `APP_ENV` (falling back to `NODE_ENV`) and `API_URL`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(mode) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
            self.mode = RunMode::from_env_value(&mode);
        }
        if let Some(base) = lookup("API_URL") {
            self.api.base_url = base;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let api = url::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::Invalid(format!("api.base_url {:?}: {e}", self.api.base_url))
        })?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be http or https, got {}",
                api.scheme()
            )));
        }
        if self.scroll.idle_ms == 0 {
            return Err(ConfigError::Invalid("scroll.idle_ms must be > 0".into()));
        }
        if self.scroll.frame_ms == 0 {
            return Err(ConfigError::Invalid("scroll.frame_ms must be > 0".into()));
        }
        if !(self.smooth_scroll.lerp > 0.0 && self.smooth_scroll.lerp <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "smooth_scroll.lerp must be in (0, 1], got {}",
                self.smooth_scroll.lerp
            )));
        }
        if self.images.max_bytes == 0 {
            return Err(ConfigError::Invalid("images.max_bytes must be > 0".into()));
        }
        if self.status.interval_secs == 0 {
            return Err(ConfigError::Invalid("status.interval_secs must be > 0".into()));
        }
        Ok(())
    }
}
