use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::responses::error_to_response;
use crate::router::{handle, AppState};
use astra::Server;
use std::net::SocketAddr;

mod bulk;
mod config;
mod db;
mod domain;
mod errors;
mod insights;
mod logging;
mod responses;
mod router;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() {
    logging::init();

    // 1️⃣ Load configuration (file + env overrides)
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // 2️⃣ Create the database handle and apply the embedded schema
    let db = Database::new(config.database.path.clone());
    if let Err(e) = init_db(&db) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    // 3️⃣ Start the server
    let addr: SocketAddr = match config.server.bind.parse() {
        Ok(a) => a,
        Err(e) => {
            tracing::error!(bind = %config.server.bind, error = %e, "invalid bind address");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, workers = config.server.max_workers, "starting agent desk");

    let server = Server::bind(&addr).max_workers(config.server.max_workers);
    let state = AppState::new(db, config);

    // 4️⃣ Serve requests, passing shared state into closure
    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down cleanly");
}
