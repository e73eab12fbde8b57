use std::{process, sync::Arc, time::Duration};

use blockpress::{
    application::{
        error::AppError, generate::SiteGenerator, posts::PostService, source::ContentSource,
    },
    config::{self, GenerateArgs, Settings},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        notion::NotionClient,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or_else(|| config::Command::Serve(Box::new(config::ServeArgs::from_env())));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Generate(args) => run_generate(settings, args).await,
    }
}

fn build_post_service(settings: &Settings) -> Result<PostService, AppError> {
    let credentials = settings.notion.credentials()?;
    let client = NotionClient::new(&settings.notion, credentials, settings.properties.clone())?;
    let source: Arc<dyn ContentSource> = Arc::new(client);
    Ok(PostService::from_settings(source, settings))
}

async fn run_serve(settings: Settings) -> Result<(), AppError> {
    let posts = Arc::new(build_post_service(&settings)?);
    let state = HttpState::new(posts, settings.server.redact_errors)
        .map_err(|err| AppError::unexpected(format!("failed to render fixed pages: {err}")))?;
    let router = http::build_router(state);

    serve_http(router, &settings).await
}

async fn serve_http(router: axum::Router, settings: &Settings) -> Result<(), AppError> {
    let addr = settings.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "blockpress::serve",
        address = %addr,
        "listening for HTTP requests"
    );

    let shutdown = Arc::new(tokio::sync::Notify::new());
    let signal = shutdown.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move { signal.notified().await })
            .await
    });

    tokio::select! {
        joined = &mut server => return server_outcome(joined),
        result = tokio::signal::ctrl_c() => {
            result.map_err(|err| AppError::from(InfraError::from(err)))?;
        }
    }

    info!(target = "blockpress::serve", "shutdown requested; draining connections");
    shutdown.notify_one();

    drain(server, settings.server.graceful_shutdown).await
}

async fn drain(
    server: tokio::task::JoinHandle<std::io::Result<()>>,
    grace: Duration,
) -> Result<(), AppError> {
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => server_outcome(joined),
        Err(_) => {
            warn!(
                target = "blockpress::serve",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

fn server_outcome(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::from(InfraError::from(err))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn run_generate(settings: Settings, args: GenerateArgs) -> Result<(), AppError> {
    let posts = build_post_service(&settings)?;
    let mut generator = SiteGenerator::new(posts, args.output);
    if let Some(index_html) = args.index_html {
        generator = generator.with_index_html(index_html);
    }
    let summary = generator.generate().await?;

    info!(
        target = "blockpress::generate",
        written = summary.written.len(),
        skipped = summary.skipped,
        index_injected = summary.index_injected,
        "generation finished"
    );
    Ok(())
}
