/// WebSocket session handler for a running match.
///
/// Participants push their own slot and conclude the match; everyone else is a read-only spectator.
/// Every session receives the full document on each change.
use actix::prelude::*;
use actix_http::StatusCode;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, error, info};
use serde_json::json;
use uuid::Uuid;

use super::messages::{
    ClientMatchMessage, FinishMatch, GetMatchRoom, MatchSnapshot, ResolveRole, ServerMatchMessage,
    SubscribeMatch, UnsubscribeMatch, WriteSlot,
};
use super::server::MatchRoom;
use crate::error::StoreError;
use crate::race::types::{ClientId, MatchId, Role, SlotUpdate, SubscriptionId};
use crate::server::anti_spam::AntiSpamState;
use crate::server::session_utils::{client_id_from_query, parse_query};
use crate::server::state::AppState;
use crate::server::ws_actor_utils::WsActorUtils;
use crate::server::ws_error::http_error_response;

pub struct MatchSession {
    pub client_id: ClientId,
    pub match_id: MatchId,
    /// None for spectators.
    pub role: Option<Role>,
    pub room: Addr<MatchRoom>,
    subscription: Option<SubscriptionId>,
    anti_spam: AntiSpamState,
}

impl MatchSession {
    pub fn new(client_id: ClientId, match_id: MatchId, role: Option<Role>, room: Addr<MatchRoom>) -> Self {
        Self {
            client_id,
            match_id,
            role,
            room,
            subscription: None,
            anti_spam: AntiSpamState::new(),
        }
    }

    fn send_message(&mut self, ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMatchMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => ctx.text(text),
            Err(e) => error!("[MatchSession] Failed to serialize ServerMatchMessage: {}", e),
        }
    }

    fn context(&self) -> serde_json::Value {
        json!({ "clientId": self.client_id, "matchId": self.match_id })
    }

    fn send_store_error(&mut self, ctx: &mut ws::WebsocketContext<Self>, err: &StoreError) {
        let context = self.context();
        self.send_error_and_maybe_ban(ctx, err.code(), &err.to_string(), Some(context));
    }

    fn push(&mut self, role: Role, update: SlotUpdate, ctx: &mut ws::WebsocketContext<Self>) {
        self.room
            .send(WriteSlot {
                client_id: self.client_id.clone(),
                role,
                update,
            })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res.map_err(StoreError::from).and_then(|r| r) {
                    Ok(()) => act.anti_spam.reset_on_valid_action(),
                    Err(e) => act.send_store_error(ctx, &e),
                }
                fut::ready(())
            })
            .spawn(ctx);
    }

    fn conclude(&mut self, forfeit: bool, ctx: &mut ws::WebsocketContext<Self>) {
        self.room
            .send(FinishMatch { client_id: self.client_id.clone(), forfeit })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res.map_err(StoreError::from).and_then(|r| r) {
                    Ok(()) => act.anti_spam.reset_on_valid_action(),
                    Err(e) => act.send_store_error(ctx, &e),
                }
                fut::ready(())
            })
            .spawn(ctx);
    }
}

impl WsActorUtils for MatchSession {
    fn anti_spam(&mut self) -> &mut AntiSpamState {
        &mut self.anti_spam
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }
}

impl Actor for MatchSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        match self.role {
            Some(role) => info!("[MatchSession] {} joined match {} as {}", self.client_id, self.match_id, role),
            None => info!("[MatchSession] {} watching match {}", self.client_id, self.match_id),
        }
        let joined = ServerMatchMessage::Joined { match_id: self.match_id, role: self.role };
        self.send_message(ctx, &joined);

        self.room
            .send(SubscribeMatch { subscriber: ctx.address().recipient() })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(subscription) => {
                        act.subscription = Some(subscription.id);
                        act.send_message(ctx, &ServerMatchMessage::Snapshot(subscription.doc));
                    }
                    Err(e) => {
                        error!("[MatchSession] Room for match {} unavailable: {}", act.match_id, e);
                        ctx.text(crate::server::ws_error::ws_store_error_message(
                            &StoreError::from(e),
                            Some(act.context()),
                        ));
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.subscription.take() {
            self.room.do_send(UnsubscribeMatch { id });
        }
        debug!("[MatchSession] {} left match {}", self.client_id, self.match_id);
    }
}

impl Handler<MatchSnapshot> for MatchSession {
    type Result = ();

    fn handle(&mut self, msg: MatchSnapshot, ctx: &mut Self::Context) {
        self.send_message(ctx, &ServerMatchMessage::Snapshot(msg.doc));
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for MatchSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                if !self.accept_request(ctx) {
                    return;
                }
                let parsed = serde_json::from_str::<ClientMatchMessage>(&text);
                match (parsed, self.role) {
                    (Ok(ClientMatchMessage::Ping), _) => {}
                    (Ok(_), None) => {
                        let context = self.context();
                        self.send_error_and_maybe_ban(
                            ctx,
                            "SPECTATOR_READ_ONLY",
                            "Spectators cannot write to a match",
                            Some(context),
                        );
                    }
                    (Ok(ClientMatchMessage::Push(update)), Some(role)) => self.push(role, update, ctx),
                    (Ok(ClientMatchMessage::Conclude), Some(_)) => self.conclude(false, ctx),
                    (Ok(ClientMatchMessage::Forfeit), Some(_)) => self.conclude(true, ctx),
                    (Err(_), _) => {
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

/// WebSocket endpoint for one match: `/ws/match/{match_id}?client_id=...`.
pub async fn ws_match(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let raw_id = path.into_inner();
    let match_id = match Uuid::parse_str(&raw_id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(http_error_response(
                "INVALID_MATCH_ID",
                "Match id is not a valid UUID",
                Some(json!({ "matchId": raw_id })),
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    let params = parse_query(req.query_string());
    let client_id = match client_id_from_query(&params) {
        Some(id) => id,
        None => {
            return Ok(http_error_response(
                "MISSING_CLIENT_ID",
                "Missing client_id query parameter",
                None,
                StatusCode::BAD_REQUEST,
            ));
        }
    };

    let room = match data.registry.send(GetMatchRoom { match_id }).await {
        Ok(Ok(room)) => room,
        Ok(Err(e)) => {
            return Ok(http_error_response(
                e.code(),
                &e.to_string(),
                Some(json!({ "matchId": match_id })),
                StatusCode::NOT_FOUND,
            ));
        }
        Err(e) => {
            let e = StoreError::from(e);
            return Ok(http_error_response(e.code(), &e.to_string(), None, StatusCode::SERVICE_UNAVAILABLE));
        }
    };

    let role = match room.send(ResolveRole { client_id: client_id.clone() }).await {
        Ok(role) => role,
        Err(_) => {
            return Ok(http_error_response(
                "MATCH_NOT_FOUND",
                "Match is closed",
                Some(json!({ "matchId": match_id })),
                StatusCode::NOT_FOUND,
            ));
        }
    };

    ws::start(MatchSession::new(client_id, match_id, role, room), &req, stream)
}
