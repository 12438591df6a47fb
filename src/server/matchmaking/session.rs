/// WebSocket session handler for the pairing queue.
///
/// This actor manages a single client's connection to the queue: it joins on connect,
/// relays leave/ack requests, forwards the matched notification, and leaves on disconnect.
use actix::prelude::*;
use actix_http::StatusCode;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, error};
use serde_json::json;

use super::messages::{AckMatched, ClientQueueMessage, JoinOutcome, JoinQueue, LeaveQueue, QueueNotification, ServerQueueMessage};
use super::server::MatchmakingServer;
use crate::race::types::{PlayerProfile, TicketId};
use crate::server::anti_spam::AntiSpamState;
use crate::server::session_utils::{parse_query, profile_from_query};
use crate::server::ws_actor_utils::{close_for_policy, WsActorUtils};
use crate::server::ws_error::{http_error_response, ws_session_kicked_message, ws_store_error_message};

/// Represents a client's WebSocket session in the queue.
pub struct QueueSession {
    pub profile: PlayerProfile,
    pub matchmaking_addr: Addr<MatchmakingServer>,
    /// Ticket held while waiting; cleared once matched, left or kicked.
    ticket: Option<TicketId>,
    anti_spam: AntiSpamState,
}

impl QueueSession {
    pub fn new(profile: PlayerProfile, matchmaking_addr: Addr<MatchmakingServer>) -> Self {
        Self {
            profile,
            matchmaking_addr,
            ticket: None,
            anti_spam: AntiSpamState::new(),
        }
    }

    fn send_message(&mut self, ctx: &mut ws::WebsocketContext<Self>, msg: &ServerQueueMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                error!("[QueueSession] Failed to serialize ServerQueueMessage: {}", e);
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Error,
                    description: Some("Internal server error".into()),
                }));
                ctx.stop();
            }
        }
    }

    fn leave(&mut self) -> bool {
        match self.ticket.take() {
            Some(ticket) => {
                self.matchmaking_addr.do_send(LeaveQueue {
                    client_id: self.profile.client_id.clone(),
                    ticket,
                });
                true
            }
            None => false,
        }
    }
}

impl WsActorUtils for QueueSession {
    fn anti_spam(&mut self) -> &mut AntiSpamState {
        &mut self.anti_spam
    }

    fn client_id(&self) -> &str {
        &self.profile.client_id
    }
}

impl Actor for QueueSession {
    type Context = ws::WebsocketContext<Self>;

    /// Called when the session starts. Runs the pairing transaction for this client.
    fn started(&mut self, ctx: &mut Self::Context) {
        self.matchmaking_addr
            .send(JoinQueue {
                profile: self.profile.clone(),
                notify: ctx.address().recipient(),
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(Ok(outcome)) => {
                        match &outcome {
                            JoinOutcome::Waiting { ticket, .. } => act.ticket = Some(*ticket),
                            JoinOutcome::Matched(_) => act.ticket = None,
                        }
                        act.send_message(ctx, &ServerQueueMessage::from_outcome(&outcome));
                    }
                    Ok(Err(e)) => {
                        ctx.text(ws_store_error_message(&e, Some(json!({ "clientId": act.profile.client_id }))));
                        ctx.stop();
                    }
                    Err(e) => {
                        error!("[QueueSession] Matchmaking unavailable: {}", e);
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    /// Called when the session stops. Gives the ticket back if still waiting.
    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if self.leave() {
            debug!("[QueueSession] Client {} disconnected while queued", self.profile.client_id);
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for QueueSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                if !self.accept_request(ctx) {
                    return;
                }
                match serde_json::from_str::<ClientQueueMessage>(&text) {
                    Ok(ClientQueueMessage::Leave) => {
                        self.leave();
                        self.anti_spam.reset_on_valid_action();
                        let reply = serde_json::to_string(&ServerQueueMessage::Left).unwrap_or_default();
                        self.send_json_or_ban(ctx, reply);
                    }
                    Ok(ClientQueueMessage::Ack { match_id }) => {
                        self.matchmaking_addr.do_send(AckMatched {
                            client_id: self.profile.client_id.clone(),
                            match_id,
                        });
                    }
                    Ok(ClientQueueMessage::Ping) => {}
                    Err(_) => {
                        self.send_error_and_maybe_ban(ctx, "INVALID_MESSAGE", "Invalid client message", None);
                    }
                }
            }
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(_) => ctx.stop(),
            _ => (),
        }
    }
}

impl Handler<QueueNotification> for QueueSession {
    type Result = ();

    fn handle(&mut self, msg: QueueNotification, ctx: &mut Self::Context) {
        match msg {
            QueueNotification::Matched(assignment) => {
                self.ticket = None;
                self.send_message(ctx, &ServerQueueMessage::matched(&assignment));
                // Written to the socket: the notice is consumed.
                self.matchmaking_addr.do_send(AckMatched {
                    client_id: self.profile.client_id.clone(),
                    match_id: assignment.match_id,
                });
            }
            QueueNotification::Kicked { reason } => {
                // The ticket now belongs to the newer session.
                self.ticket = None;
                ctx.text(ws_session_kicked_message(&reason, Some(json!({ "clientId": self.profile.client_id }))));
                close_for_policy(ctx, "Session replaced");
            }
        }
    }
}

/// WebSocket endpoint for the pairing queue.
///
/// Expects query parameters: `client_id` (required), `username`, `icon`, `outfit` (optional).
pub async fn ws_queue(
    req: HttpRequest,
    stream: web::Payload,
    data: web::Data<crate::server::state::AppState>,
) -> Result<HttpResponse, Error> {
    let params = parse_query(req.query_string());
    let profile = match profile_from_query(&params) {
        Some(profile) => profile,
        None => {
            return Ok(http_error_response(
                "MISSING_CLIENT_ID",
                "Missing client_id query parameter",
                None,
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    ws::start(
        QueueSession::new(profile, data.matchmaking_addr.clone()),
        &req,
        stream,
    )
}
