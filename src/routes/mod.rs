// Route module decomposition — each transport concern in its own file.

mod envelopes;
mod floor_routes;
mod manifests;
mod stream;
mod system;
mod ws;

pub use envelopes::{send_envelope, send_utterance, validate_envelope};
pub use floor_routes::{get_holder, release_floor, request_floor};
pub use manifests::{get_manifests, list_manifests, publish_manifests, search_manifests};
pub use stream::floor_events;
pub use system::{health, not_found};
pub use ws::floor_ws;
