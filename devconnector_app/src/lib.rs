pub mod app;
pub mod config;

mod routes;

#[cfg(test)]
mod test_util;

use entrait::Impl;
use tower_http::trace::TraceLayer;

pub async fn serve(app: app::App) -> anyhow::Result<()> {
    let listen_addr = app.config.listen_addr;

    let router = routes::api_router()
        .layer(axum::Extension(Impl::new(app)))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {listen_addr}");

    axum::serve(listener, router).await?;

    Ok(())
}
