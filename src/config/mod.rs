//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{
    CliArgs, Command, GenerateArgs, LoggingOverrides, NotionOverrides, ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "blockpress";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_NOTION_API_BASE_URL: &str = "https://api.notion.com";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 30;
pub const MAX_BLOCK_PAGE_SIZE: u32 = 100;
pub const DEFAULT_GRID_CLASS: &str = "blog-image-grid";
const DEFAULT_SITE_NAME: &str = "Ray Portfolio Website";
const DEFAULT_STYLESHEET_HREF: &str = "/style.css";
const DEFAULT_SCRIPT_HREF: &str = "/script.js";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub notion: NotionSettings,
    pub properties: PropertySettings,
    pub render: RenderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
    pub redact_errors: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub token: Option<String>,
    pub database_id: Option<String>,
    pub api_base_url: Url,
    pub version: String,
    pub timeout: Duration,
    pub block_page_size: NonZeroU32,
}

/// Credentials that must be present before any request reaches the content source.
#[derive(Debug, Clone)]
pub struct NotionCredentials {
    pub token: String,
    pub database_id: String,
}

impl NotionSettings {
    pub fn credentials(&self) -> Result<NotionCredentials, LoadError> {
        let token = self
            .token
            .clone()
            .ok_or_else(|| LoadError::invalid("notion.token", "an integration token is required"))?;
        let database_id = self.database_id.clone().ok_or_else(|| {
            LoadError::invalid("notion.database_id", "a database identifier is required")
        })?;
        Ok(NotionCredentials { token, database_id })
    }
}

/// Names of the database properties the metadata extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySettings {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub tags: String,
    pub published: String,
}

impl Default for PropertySettings {
    fn default() -> Self {
        Self {
            title: "Title".to_string(),
            slug: "Slug".to_string(),
            date: "Date".to_string(),
            tags: "Tags".to_string(),
            published: "Published".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub grid_class: String,
    pub escape_metadata: bool,
    pub site_name: String,
    pub stylesheet_href: String,
    pub script_href: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            grid_class: DEFAULT_GRID_CLASS.to_string(),
            escape_metadata: true,
            site_name: DEFAULT_SITE_NAME.to_string(),
            stylesheet_href: DEFAULT_STYLESHEET_HREF.to_string(),
            script_href: DEFAULT_SCRIPT_HREF.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("BLOCKPRESS").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Generate(args)) => {
            raw.apply_notion_overrides(&args.notion);
            raw.apply_logging_overrides(&args.logging);
        }
        None => raw.apply_serve_overrides(&ServeArgs::from_env().overrides),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    notion: RawNotionSettings,
    properties: RawPropertySettings,
    render: RawRenderSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(redact) = overrides.redact_errors {
            self.server.redact_errors = Some(redact);
        }

        self.apply_notion_overrides(&overrides.notion);
        self.apply_logging_overrides(&overrides.logging);
    }

    fn apply_notion_overrides(&mut self, overrides: &NotionOverrides) {
        if let Some(token) = overrides.token.as_ref() {
            self.notion.token = Some(token.clone());
        }
        if let Some(database_id) = overrides.database_id.as_ref() {
            self.notion.database_id = Some(database_id.clone());
        }
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.notion.api_base_url = Some(url.clone());
        }
    }

    fn apply_logging_overrides(&mut self, overrides: &LoggingOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            notion,
            properties,
            render,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let notion = build_notion_settings(notion)?;
        let properties = build_property_settings(properties)?;
        let render = build_render_settings(render)?;

        Ok(Self {
            server,
            logging,
            notion,
            properties,
            render,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
        redact_errors: server.redact_errors.unwrap_or(false),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_notion_settings(notion: RawNotionSettings) -> Result<NotionSettings, LoadError> {
    let token = non_blank(notion.token);
    let database_id = non_blank(notion.database_id);

    let base = notion
        .api_base_url
        .unwrap_or_else(|| DEFAULT_NOTION_API_BASE_URL.to_string());
    let api_base_url = Url::parse(base.trim())
        .map_err(|err| LoadError::invalid("notion.api_base_url", format!("invalid URL: {err}")))?;

    let version = non_blank(notion.version).unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

    let timeout_secs = notion.timeout_seconds.unwrap_or(DEFAULT_NOTION_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "notion.timeout_seconds",
            "must be greater than zero",
        ));
    }

    let page_size = notion
        .block_page_size
        .unwrap_or(u64::from(MAX_BLOCK_PAGE_SIZE));
    if page_size > u64::from(MAX_BLOCK_PAGE_SIZE) {
        return Err(LoadError::invalid(
            "notion.block_page_size",
            format!("must not exceed {MAX_BLOCK_PAGE_SIZE}"),
        ));
    }
    let block_page_size = non_zero_u32(page_size, "notion.block_page_size")?;

    Ok(NotionSettings {
        token,
        database_id,
        api_base_url,
        version,
        timeout: Duration::from_secs(timeout_secs),
        block_page_size,
    })
}

fn build_property_settings(
    properties: RawPropertySettings,
) -> Result<PropertySettings, LoadError> {
    let defaults = PropertySettings::default();
    let RawPropertySettings {
        title,
        slug,
        date,
        tags,
        published,
    } = properties;

    Ok(PropertySettings {
        title: property_name(title, defaults.title, "properties.title")?,
        slug: property_name(slug, defaults.slug, "properties.slug")?,
        date: property_name(date, defaults.date, "properties.date")?,
        tags: property_name(tags, defaults.tags, "properties.tags")?,
        published: property_name(published, defaults.published, "properties.published")?,
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let defaults = RenderSettings::default();

    let grid_class = render.grid_class.unwrap_or(defaults.grid_class);
    let grid_class = grid_class.trim().to_string();
    if grid_class.is_empty() {
        return Err(LoadError::invalid(
            "render.grid_class",
            "class name must not be empty",
        ));
    }
    if grid_class.contains(['"', '<', '>']) {
        return Err(LoadError::invalid(
            "render.grid_class",
            "class name must not contain quotes or angle brackets",
        ));
    }

    Ok(RenderSettings {
        grid_class,
        escape_metadata: render.escape_metadata.unwrap_or(defaults.escape_metadata),
        site_name: render.site_name.unwrap_or(defaults.site_name),
        stylesheet_href: render.stylesheet_href.unwrap_or(defaults.stylesheet_href),
        script_href: render.script_href.unwrap_or(defaults.script_href),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
    redact_errors: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionSettings {
    token: Option<String>,
    database_id: Option<String>,
    api_base_url: Option<String>,
    version: Option<String>,
    timeout_seconds: Option<u64>,
    block_page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPropertySettings {
    title: Option<String>,
    slug: Option<String>,
    date: Option<String>,
    tags: Option<String>,
    published: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    grid_class: Option<String>,
    escape_metadata: Option<bool>,
    site_name: Option<String>,
    stylesheet_href: Option<String>,
    script_href: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn property_name(
    value: Option<String>,
    default: String,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default),
        Some(name) if name.trim().is_empty() => {
            Err(LoadError::invalid(key, "property name must not be empty"))
        }
        Some(name) => Ok(name),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
