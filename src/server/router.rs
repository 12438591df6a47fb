//! HTTP and WebSocket routing configuration.
//!
//! Each endpoint is handled by a dedicated WebSocket actor.

use actix_web::web;
use crate::server::matchmaking::session::ws_queue;
use crate::server::match_room::session::ws_match;

/// Configure the application's HTTP/WebSocket routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ws/queue")
            .to(ws_queue)
    )
    .service(
        web::resource("/ws/match/{match_id}")
            .to(ws_match)
    );
}
