mod config;
mod db;
mod error;
mod nav;
mod routes;
mod session;
mod state;
mod storage;
mod templates;
mod workflow;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_portal=info,tower_http=info".into()),
        )
        .init();

    let config = Arc::new(config::Config::from_env());

    storage::ensure_upload_dir(&config.upload_folder)?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(pool.as_ref()).await?;

    let state = Arc::new(state::AppState {
        store: db::PgStore::new(pool),
        config: config.clone(),
        tera: Arc::new(templates::build_tera()?),
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Research portal listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
