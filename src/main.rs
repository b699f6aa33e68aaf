use actix::Actor;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::info;
use std::sync::Arc;

use chess_session_client::authority::HttpAuthority;
use chess_session_client::config::Config;
use chess_session_client::routes::configure_routes;
use chess_session_client::session::{Identity, LocalStore, SessionActor};
use chess_session_client::state::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = Config::parse();

    let mut store = LocalStore::open(&config.state_dir)
        .with_context(|| format!("opening client state in {}", config.state_dir.display()))?;
    if let Some(username) = &config.sign_in {
        store
            .set_identity(&Identity::new(username.as_str()))
            .context("storing the signed-in identity")?;
    }

    let authority = HttpAuthority::new(config.authority_url.as_str(), config.request_timeout())
        .context("building the authority client")?;
    info!("Using authority at {}", config.authority_url);

    let session = SessionActor::new(Arc::new(authority), store, config.settings(), config.login_url.as_str()).start();
    let app_state = web::Data::new(AppState { session });

    info!("Starting rendering bridge at http://{}:{}", config.host, config.port);
    HttpServer::new(move || App::new().app_data(app_state.clone()).configure(configure_routes))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;
    Ok(())
}
