use crate::api::ApiClient;
use crate::config::EnvConfig;
use crate::models::Bookmark;
use serde::Deserialize;
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Channel topic for row changes on the bookmarks table.
pub(crate) const CHANGES_TOPIC: &str = "realtime:public:bookmarks";

const HEARTBEAT_TOPIC: &str = "phoenix";
const HEARTBEAT_INTERVAL_MS: i32 = 30_000;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ChangeEvent {
    Insert(Bookmark),
    Delete {
        id: String,
        /// Owner id when the backend includes the old row; delete payloads
        /// without full replica identity omit it.
        user_id: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub(crate) enum ChannelState {
    Connecting,
    Joined,
    Closed,
    Errored,
}

#[derive(Deserialize)]
struct Frame {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

fn join_frame(join_ref: &str, access_token: Option<&str>) -> String {
    serde_json::json!({
        "topic": CHANGES_TOPIC,
        "event": "phx_join",
        "payload": { "access_token": access_token },
        "ref": join_ref,
    })
    .to_string()
}

fn heartbeat_frame(msg_ref: u64) -> String {
    serde_json::json!({
        "topic": HEARTBEAT_TOPIC,
        "event": "heartbeat",
        "payload": {},
        "ref": msg_ref.to_string(),
    })
    .to_string()
}

/// Parse an inbound frame into a row change. Anything that is not an
/// INSERT/DELETE on the bookmarks topic (join acks, heartbeat replies,
/// UPDATE events for a table whose rows are never mutated) yields `None`.
pub(crate) fn parse_change_message(raw: &str) -> Option<ChangeEvent> {
    let frame: Frame = serde_json::from_str(raw).ok()?;
    if frame.topic != CHANGES_TOPIC {
        return None;
    }

    match frame.event.as_str() {
        "INSERT" => frame
            .payload
            .get("record")
            .and_then(ApiClient::parse_bookmark_row)
            .map(ChangeEvent::Insert),
        "DELETE" => {
            let old = frame.payload.get("old_record")?;
            let id = old.get("id").and_then(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .or_else(|| v.as_i64().map(|n| n.to_string()))
            })?;

            let user_id = old
                .get("user_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            Some(ChangeEvent::Delete { id, user_id })
        }
        _ => None,
    }
}

pub(crate) fn is_join_ack(raw: &str) -> bool {
    let Ok(frame) = serde_json::from_str::<Frame>(raw) else {
        return false;
    };

    frame.topic == CHANGES_TOPIC
        && frame.event == "phx_reply"
        && frame.payload.get("status").and_then(|v| v.as_str()) == Some("ok")
}

/// Live subscription to the backend's change feed.
///
/// The backend speaks Phoenix-style frames `{topic, event, payload, ref}`
/// over a WebSocket: a join frame opens the channel, a heartbeat keeps it
/// alive, and row changes arrive as INSERT/DELETE events. The channel only
/// relays what the backend pushes; there is no replay, no buffering and no
/// reconnection. Dropping the handle alone does not close the socket; call
/// `close()` from the view's cleanup.
pub(crate) struct RealtimeChannel {
    socket: web_sys::WebSocket,
    heartbeat_id: i32,
    _on_open: Closure<dyn FnMut()>,
    _on_message: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _on_error: Closure<dyn FnMut(web_sys::ErrorEvent)>,
    _on_close: Closure<dyn FnMut(web_sys::CloseEvent)>,
    _heartbeat: Closure<dyn FnMut()>,
}

impl RealtimeChannel {
    /// Open the socket and join the bookmarks channel. `join_ref` must be
    /// unique per view instance so independently open tabs never collide.
    pub fn subscribe(
        config: &EnvConfig,
        access_token: Option<String>,
        join_ref: String,
        on_event: impl Fn(ChangeEvent) + 'static,
        on_state: impl Fn(ChannelState) + Clone + 'static,
    ) -> Option<Self> {
        let socket = web_sys::WebSocket::new(&config.realtime_url()).ok()?;

        let msg_ref = Rc::new(Cell::new(1u64));
        let next_ref = {
            let msg_ref = Rc::clone(&msg_ref);
            move || {
                let n = msg_ref.get();
                msg_ref.set(n + 1);
                n
            }
        };

        let on_open = {
            let socket = socket.clone();
            let on_state = on_state.clone();
            Closure::wrap(Box::new(move || {
                let _ = socket.send_with_str(&join_frame(&join_ref, access_token.as_deref()));
                on_state(ChannelState::Connecting);
            }) as Box<dyn FnMut()>)
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_message = {
            let on_state = on_state.clone();
            Closure::wrap(Box::new(move |ev: web_sys::MessageEvent| {
                let Some(raw) = ev.data().as_string() else {
                    return;
                };

                if is_join_ack(&raw) {
                    on_state(ChannelState::Joined);
                    return;
                }

                if let Some(change) = parse_change_message(&raw) {
                    on_event(change);
                }
            }) as Box<dyn FnMut(web_sys::MessageEvent)>)
        };
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_error = {
            let on_state = on_state.clone();
            Closure::wrap(Box::new(move |_ev: web_sys::ErrorEvent| {
                on_state(ChannelState::Errored);
            }) as Box<dyn FnMut(web_sys::ErrorEvent)>)
        };
        socket.set_onerror(Some(on_error.as_ref().unchecked_ref()));

        let on_close = {
            let on_state = on_state.clone();
            Closure::wrap(Box::new(move |_ev: web_sys::CloseEvent| {
                on_state(ChannelState::Closed);
            }) as Box<dyn FnMut(web_sys::CloseEvent)>)
        };
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        let heartbeat = {
            let socket = socket.clone();
            Closure::wrap(Box::new(move || {
                if socket.ready_state() == web_sys::WebSocket::OPEN {
                    let _ = socket.send_with_str(&heartbeat_frame(next_ref()));
                }
            }) as Box<dyn FnMut()>)
        };

        let heartbeat_id = web_sys::window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                heartbeat.as_ref().unchecked_ref(),
                HEARTBEAT_INTERVAL_MS,
            )
            .unwrap_or(0);

        Some(Self {
            socket,
            heartbeat_id,
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
            _heartbeat: heartbeat,
        })
    }

    /// Tear down the subscription: stop the heartbeat, detach the handlers,
    /// close the socket. Safe to call once from view cleanup.
    pub fn close(&self) {
        if let Some(win) = web_sys::window() {
            win.clear_interval_with_handle(self.heartbeat_id);
        }

        self.socket.set_onopen(None);
        self.socket.set_onmessage(None);
        self.socket.set_onerror(None);
        self.socket.set_onclose(None);
        let _ = self.socket.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_event_parses_record() {
        let raw = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "INSERT",
            "payload": {
                "table": "bookmarks",
                "record": {
                    "id": "b-1",
                    "title": "Example",
                    "url": "https://example.com",
                    "user_id": "u-1",
                    "created_at": "2026-01-01T00:00:00Z"
                }
            },
            "ref": null
        })
        .to_string();

        match parse_change_message(&raw) {
            Some(ChangeEvent::Insert(row)) => {
                assert_eq!(row.id, "b-1");
                assert_eq!(row.title, "Example");
                assert_eq!(row.user_id, "u-1");
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn delete_event_parses_old_record_with_and_without_owner() {
        let with_owner = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "DELETE",
            "payload": { "old_record": { "id": "b-1", "user_id": "u-1" } }
        })
        .to_string();
        assert_eq!(
            parse_change_message(&with_owner),
            Some(ChangeEvent::Delete {
                id: "b-1".to_string(),
                user_id: Some("u-1".to_string()),
            })
        );

        // Without replica identity only the id survives.
        let id_only = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "DELETE",
            "payload": { "old_record": { "id": 7 } }
        })
        .to_string();
        assert_eq!(
            parse_change_message(&id_only),
            Some(ChangeEvent::Delete {
                id: "7".to_string(),
                user_id: None,
            })
        );
    }

    #[test]
    fn non_change_frames_are_ignored() {
        // Heartbeat reply lives on the phoenix topic.
        let heartbeat_reply = serde_json::json!({
            "topic": "phoenix",
            "event": "phx_reply",
            "payload": {"status": "ok"}
        })
        .to_string();
        assert_eq!(parse_change_message(&heartbeat_reply), None);

        // Rows are never mutated in place; UPDATE has no meaning here.
        let update = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "UPDATE",
            "payload": {"record": {"id": "b-1", "url": "https://x.example"}}
        })
        .to_string();
        assert_eq!(parse_change_message(&update), None);

        assert_eq!(parse_change_message("not json"), None);
    }

    #[test]
    fn join_ack_is_recognized_on_the_changes_topic_only() {
        let ack = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "phx_reply",
            "payload": {"status": "ok"}
        })
        .to_string();
        assert!(is_join_ack(&ack));

        let error_reply = serde_json::json!({
            "topic": CHANGES_TOPIC,
            "event": "phx_reply",
            "payload": {"status": "error"}
        })
        .to_string();
        assert!(!is_join_ack(&error_reply));

        let foreign_topic = serde_json::json!({
            "topic": "phoenix",
            "event": "phx_reply",
            "payload": {"status": "ok"}
        })
        .to_string();
        assert!(!is_join_ack(&foreign_topic));
    }

    #[test]
    fn outbound_frames_carry_topic_event_and_ref() {
        let join: serde_json::Value =
            serde_json::from_str(&join_frame("j-1", Some("jwt"))).expect("join frame is JSON");
        assert_eq!(join["topic"], CHANGES_TOPIC);
        assert_eq!(join["event"], "phx_join");
        assert_eq!(join["payload"]["access_token"], "jwt");
        assert_eq!(join["ref"], "j-1");

        let beat: serde_json::Value =
            serde_json::from_str(&heartbeat_frame(4)).expect("heartbeat frame is JSON");
        assert_eq!(beat["topic"], "phoenix");
        assert_eq!(beat["event"], "heartbeat");
        assert_eq!(beat["ref"], "4");
    }
}
