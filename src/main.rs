use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

mod auth;
mod cache;
mod comments;
mod config;
mod error;
mod follows;
mod groups;
mod pagination;
mod posts;
mod response;

use cache::ResponseCache;
use config::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    settings: Settings,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> PgPool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for Settings {
    fn from_ref(app_state: &AppState) -> Settings {
        app_state.settings.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::new();

    let pool = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("database connected");

    let app_state = AppState {
        pool,
        settings: settings.clone(),
    };

    let index_cache = ResponseCache::default();

    let auth_router = Router::new()
        .route("/sign-up", post(auth::handler::signup))
        .route("/sign-in", post(auth::handler::login))
        .route("/me", get(auth::handler::get_me));

    let post_router = Router::new()
        .route(
            "/",
            get(posts::handler::index).post(posts::handler::post_create),
        )
        // Only the recent-posts listing is cached; the middleware skips
        // non-GET requests, so post_create on the same path is unaffected.
        .route_layer(middleware::from_fn_with_state(
            index_cache.clone(),
            cache::cache_page,
        ))
        .route(
            "/:id",
            get(posts::handler::post_detail).put(posts::handler::post_edit),
        )
        .route("/:id/comments", post(comments::handler::add_comment));

    let group_router = Router::new()
        .route(
            "/",
            get(groups::handler::list_groups).post(groups::handler::create_group),
        )
        .route("/:slug/posts", get(posts::handler::group_posts));

    let profile_router = Router::new()
        .route("/:username", get(follows::handler::profile))
        .route("/:username/follow", post(follows::handler::profile_follow))
        .route(
            "/:username/unfollow",
            post(follows::handler::profile_unfollow),
        );

    let feed_router = Router::new().route("/", get(follows::handler::follow_index));

    let app = Router::new()
        .nest("/api/auth", auth_router)
        .nest("/api/posts", post_router)
        .nest("/api/groups", group_router)
        .nest("/api/profiles", profile_router)
        .nest("/api/feed", feed_router)
        .with_state(app_state);

    info!("Server running on http://localhost:{}", settings.port);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
