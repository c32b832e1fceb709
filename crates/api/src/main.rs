// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{error::Error, net::SocketAddr, sync::Arc};

use hyper::{Request, body::Incoming};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    service::TowerToHyperService,
};
use tdhctf_api::{
    config::Config,
    routes::{self, AppState},
    store::CatalogStore,
};
use tdhctf_catalog::Assembler;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.public_host.is_none() {
        tracing::info!("PUBLIC_HOST is not set; endpoint hosts will be derived from each request");
    }

    let assembler = Assembler::new(&config.challenge_files_dir);
    let store = CatalogStore::init(config.database_url.as_deref(), assembler).await;
    let state = Arc::new(AppState::new(
        store,
        &config.challenge_files_dir,
        config.public_host.clone(),
        config.server_hostname.clone(),
    ));

    let service = tower::ServiceBuilder::new()
        .layer(routes::cors_layer(config.client_origin.as_deref()))
        .service_fn(move |req: Request<Incoming>| routes::handle(req, state.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Challenge catalog listening on http://{addr}");
    loop {
        let (stream, remote_addr) = listener.accept().await?;

        let io = TokioIo::new(stream);
        let service = TowerToHyperService::new(service.clone());

        tokio::spawn(async move {
            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                tracing::error!("Error serving connection from {remote_addr}: {e}");
            }
        });
    }
}
