use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tracing::info;

use tower_http::services::ServeDir;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

#[allow(unused_imports)]
use super::slowdown_request;
use super::{
    artwork::make_artwork_routes, browse_routes::make_browse_routes,
    download_routes::make_download_routes, library_routes::make_library_routes, log_requests,
    pairing_routes::make_pairing_routes, playback_routes::make_playback_routes,
    state::ServerState, upload_routes::make_upload_routes, websocket::ws_handler,
};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub connections: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        connections: state.ws_connection_manager.connection_count().await,
    };
    Json(stats)
}

pub fn make_app(state: ServerState) -> Router {
    let home_router: Router = match state.config.frontend_dir_path.clone() {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let websocket_routes: Router = Router::new()
        .route("/echo", get(ws_handler))
        .with_state(state.clone());

    let mut app: Router = home_router
        .merge(make_pairing_routes(state.clone()))
        .merge(make_playback_routes(state.clone()))
        .merge(make_library_routes(state.clone()))
        .merge(make_browse_routes(state.clone()))
        .merge(make_download_routes(state.clone()))
        .merge(make_artwork_routes(state.clone()))
        .merge(make_upload_routes(state.clone()))
        .merge(websocket_routes);

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    app
}

/// Serve on an already bound listener until `shutdown` resolves, then close
/// every WebSocket connection and let in-flight requests finish.
pub async fn serve<F>(listener: tokio::net::TcpListener, state: ServerState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let connections = state.ws_connection_manager.clone();
    let app = make_app(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.await;
        let closed = connections.close_all().await;
        info!("Shutting down, closed {} WebSocket connections", closed);
    })
    .await?;
    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let address = format!("{}:{}", state.config.bind_address, state.config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Remote access listening on http://{}", address);

    serve(listener, state, ctrl_c()).await
}
