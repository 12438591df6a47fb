use actix::ActorContext;
use actix_web_actors::ws;
use serde_json::{json, Value};

use crate::server::anti_spam::AntiSpamState;
use crate::server::ws_error::ws_error_message;

/// Close the socket with a policy-violation code and stop the session actor.
pub fn close_for_policy<A>(ctx: &mut ws::WebsocketContext<A>, description: &str)
where
    A: actix::Actor<Context = ws::WebsocketContext<A>>,
{
    ctx.close(Some(ws::CloseReason {
        code: ws::CloseCode::Policy,
        description: Some(description.to_string()),
    }));
    ctx.stop();
}

/// Flood control shared by the queue and match sessions.
pub trait WsActorUtils {
    fn anti_spam(&mut self) -> &mut AntiSpamState;
    fn client_id(&self) -> &str;

    fn send_ban_and_close<A>(&mut self, ctx: &mut ws::WebsocketContext<A>)
    where
        A: actix::Actor<Context = ws::WebsocketContext<A>>,
    {
        let remaining = self.anti_spam().ban_remaining_secs();
        let context = json!({ "clientId": self.client_id(), "banRemainingSecs": remaining });
        ctx.text(ws_error_message(
            "BANNED",
            "Too many messages. Reconnect once the ban expires.",
            Some(context),
        ));
        close_for_policy(ctx, "Banned for spam");
    }

    /// Count an incoming frame. Returns false (and closes) if it crossed the limit.
    fn accept_request<A>(&mut self, ctx: &mut ws::WebsocketContext<A>) -> bool
    where
        A: actix::Actor<Context = ws::WebsocketContext<A>>,
    {
        let client_id = self.client_id().to_string();
        let banned = self.anti_spam().record_request(&client_id);
        if banned {
            self.send_ban_and_close(ctx);
        }
        !banned
    }

    /// Reply with an error frame. Repeats of the previous code are dropped.
    fn send_error_and_maybe_ban<A>(
        &mut self,
        ctx: &mut ws::WebsocketContext<A>,
        code: &str,
        message: &str,
        context: Option<Value>,
    )
    where
        A: actix::Actor<Context = ws::WebsocketContext<A>>,
    {
        let client_id = self.client_id().to_string();
        if !self.anti_spam().should_send_error(code, &client_id) {
            return;
        }
        self.send_json_or_ban(ctx, ws_error_message(code, message, context));
    }

    fn send_json_or_ban<A>(&mut self, ctx: &mut ws::WebsocketContext<A>, text: String)
    where
        A: actix::Actor<Context = ws::WebsocketContext<A>>,
    {
        let client_id = self.client_id().to_string();
        if self.anti_spam().record_response(&client_id) {
            self.send_ban_and_close(ctx);
        } else {
            ctx.text(text);
        }
    }
}
