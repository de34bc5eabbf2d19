use futures_util::{SinkExt, StreamExt};
use rocket::{get, State};
use rocket_ws::{Channel, Message, WebSocket};

use crate::hub::SubscriptionEvent;
use crate::manager::FloorManager;

/// Duplex floor-transition stream (spec §4.G): server pushes transitions as
/// they are published, client may send `ping` (replied `pong`) or close.
#[get("/ws/floor/<conversation_id>")]
pub fn floor_ws(manager: &State<FloorManager>, conversation_id: &str, ws: WebSocket) -> Channel<'static> {
    let mut subscription = manager.subscribe(conversation_id);

    ws.channel(move |stream| {
        Box::pin(async move {
            let (mut sink, mut source) = stream.split();

            loop {
                tokio::select! {
                    incoming = source.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) if text.trim() == "ping" => {
                                if sink.send(Message::Text("pong".into())).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(_)) => break,
                        }
                    }
                    event = subscription.recv() => {
                        let payload = match event {
                            SubscriptionEvent::Transition(t) => serde_json::to_string(&t).unwrap_or_default(),
                            SubscriptionEvent::Lagged(n) => serde_json::json!({"lagCount": n}).to_string(),
                            SubscriptionEvent::Closed => break,
                        };
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                }
            }

            Ok(())
        })
    })
}
