use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the blockpress binary.
#[derive(Debug, Parser)]
#[command(name = "blockpress", version, about = "Notion-backed blog publisher")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BLOCKPRESS_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the listing and post endpoints over HTTP.
    Serve(Box<ServeArgs>),
    /// Render every published post into a static output directory.
    Generate(GenerateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct NotionOverrides {
    /// Notion integration token.
    #[arg(
        long = "notion-token",
        env = "NOTION_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub token: Option<String>,

    /// Identifier of the Notion database holding the posts.
    #[arg(long = "notion-database-id", env = "NOTION_DATABASE_ID", value_name = "ID")]
    pub database_id: Option<String>,

    /// Override the Notion API base URL.
    #[arg(long = "notion-api-base-url", value_name = "URL")]
    pub api_base_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoggingOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

impl ServeArgs {
    /// Serve arguments as parsed from an empty command line, so that
    /// environment fallbacks still apply when no subcommand is given.
    pub fn from_env() -> Self {
        #[derive(Parser)]
        struct EnvOnly {
            #[command(flatten)]
            args: ServeArgs,
        }

        EnvOnly::try_parse_from(["blockpress"])
            .map(|parsed| parsed.args)
            .unwrap_or_default()
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub notion: NotionOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Replace upstream failure messages with a generic message in JSON errors.
    #[arg(
        long = "server-redact-errors",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub redact_errors: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub notion: NotionOverrides,

    #[command(flatten)]
    pub logging: LoggingOverrides,

    /// Directory receiving `index.json`, `index-snippet.html` and `posts/*.html`.
    #[arg(
        long = "output",
        short = 'o',
        default_value = "blog",
        value_name = "DIR",
        value_hint = ValueHint::DirPath
    )]
    pub output: PathBuf,

    /// Site index page whose `<!-- BLOG_INDEX_SNIPPET -->` marker receives the post list.
    #[arg(long = "index-html", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub index_html: Option<PathBuf>,
}
