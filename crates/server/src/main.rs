//! quill server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use fred::interfaces::ClientLike;
use quill_api::{AppState, JsonRenderer, app};
use quill_common::{
    Config, LocalStorage, MemorySessionStore, RedisSessionStore, SessionStore, StorageBackend,
    config::SessionBackend,
};
use quill_core::{
    AdminService, CategoryService, CommentService, LikeService, PostService, SessionService,
    UserService,
};
use quill_db::repositories::{
    AttachmentRepository, CategoryRepository, CommentRepository, LikeRepository, PostRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quill=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Build the configured session store.
async fn session_store(config: &Config) -> anyhow::Result<Arc<dyn SessionStore>> {
    let session = &config.session;
    match session.backend {
        SessionBackend::Memory => {
            let ttl = Duration::from_secs(u64::try_from(session.ttl_secs).unwrap_or(0));
            info!("Using in-process session store");
            Ok(Arc::new(MemorySessionStore::new(ttl)))
        }
        SessionBackend::Redis => {
            let url = session
                .redis_url
                .as_deref()
                .context("session.redis_url is required for the redis backend")?;
            let redis_config =
                fred::types::config::Config::from_url(url).context("Invalid Redis URL")?;
            let client = fred::clients::Client::new(redis_config, None, None, None);
            client.connect();
            client
                .wait_for_connect()
                .await
                .context("Failed to connect to Redis")?;
            info!("Connected to Redis session store");

            Ok(Arc::new(RedisSessionStore::new(
                Arc::new(client),
                session.prefix.clone(),
                session.ttl_secs,
            )))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(config.logging.json);

    info!("Starting quill server...");

    let db = quill_db::init(&config.database).await?;
    quill_db::migrate(&db).await?;

    let sessions = session_store(&config).await?;
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let attachment_repo = AttachmentRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));

    // Initialize services
    let state = AppState {
        user_service: UserService::new(user_repo.clone()),
        session_service: SessionService::new(sessions),
        category_service: CategoryService::new(category_repo.clone(), post_repo.clone()),
        post_service: PostService::new(
            post_repo.clone(),
            category_repo.clone(),
            user_repo.clone(),
            attachment_repo,
            storage,
        ),
        comment_service: CommentService::new(
            comment_repo.clone(),
            post_repo.clone(),
            user_repo.clone(),
        ),
        like_service: LikeService::new(like_repo),
        admin_service: AdminService::new(user_repo, post_repo, comment_repo, category_repo),
        renderer: Arc::new(JsonRenderer),
        config: Arc::new(config.clone()),
    };

    let media_route = format!("/{}", config.storage.base_url.trim_matches('/'));
    let body_limit = config.server.body_limit;

    let router = app(state)
        .nest_service(&media_route, ServeDir::new(&config.storage.base_path))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let ip = config
        .server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid server.host: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
