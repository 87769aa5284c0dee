#![warn(clippy::all)]
#![forbid(unsafe_code)]

//! The HTTP surface spec §1 lists as an external collaborator: `/graph`,
//! `/graph.dot`, `/graph.nwdiag`, `/health`. All four are pure functions of
//! a `GraphSnapshot` taken fresh per request -- no handler holds the graph
//! lock across an await point.
//!
//! Grounded on `rita_common`/`rita_exit`'s `actix-web-async` (actix-web
//! 4.x) dependency; handlers are plain `async fn`s returning `HttpResponse`
//! registered with `.route(...)` on an `App::new()`, the native actix-web 4
//! style that supersedes the `futures01::Future`-boxing the older
//! `rita_common::dashboard::wallet` handlers use.

mod handlers;
mod json;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use lldisc_core::GraphStore;

pub use handlers::{graph_dot, graph_json, graph_nwdiag, health};

/// Builds and runs the HTTP server until the process is terminated.
/// `lldiscovery`'s binary spawns this on its own task alongside the
/// sender/receiver/tickers (spec §5: "one HTTP handler task per request").
pub async fn serve(address: &str, graph: Arc<GraphStore>) -> std::io::Result<()> {
    log::info!("http surface listening on {address}");
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(graph.clone()))
            .route("/health", web::get().to(health))
            .route("/graph", web::get().to(graph_json))
            .route("/graph.dot", web::get().to(graph_dot))
            .route("/graph.nwdiag", web::get().to(graph_nwdiag))
    })
    .bind(address)?
    .run()
    .await
}
