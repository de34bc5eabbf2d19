use rocket::response::stream::{Event, EventStream};
use rocket::{get, State};
use tokio::time::{interval, Duration};

use crate::hub::SubscriptionEvent;
use crate::manager::FloorManager;

#[get("/api/v1/floor/events/floor/<conversation_id>")]
pub fn floor_events(manager: &State<FloorManager>, conversation_id: &str) -> EventStream![] {
    let mut subscription = manager.subscribe(conversation_id);

    EventStream! {
        let mut heartbeat = interval(Duration::from_secs(30));

        loop {
            tokio::select! {
                event = subscription.recv() => {
                    match event {
                        SubscriptionEvent::Transition(t) => {
                            yield Event::json(&t).event("transition");
                        }
                        SubscriptionEvent::Lagged(n) => {
                            yield Event::json(&serde_json::json!({"lagCount": n})).event("lag");
                        }
                        SubscriptionEvent::Closed => break,
                    }
                }
                _ = heartbeat.tick() => {
                    let now = chrono::Utc::now().to_rfc3339();
                    yield Event::json(&serde_json::json!({"time": now})).event("heartbeat");
                }
            }
        }
    }
}
