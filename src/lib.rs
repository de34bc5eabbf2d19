pub mod config;
pub mod directory;
pub mod envelope;
pub mod floor;
pub mod hub;
pub mod manager;
pub mod router;
pub mod routes;

use std::sync::Arc;

use config::{cors_origins_from_env, FloorControlConfig, HubConfig, RouterConfig};
use directory::AgentDirectory;
use floor::FloorControl;
use hub::SubscriptionHub;
use manager::{publish_transitions_to, FloorManager};
use rocket_cors::{AllowedOrigins, CorsOptions};
use router::EnvelopeRouter;

pub fn rocket() -> rocket::Rocket<rocket::Build> {
    build_rocket(FloorControlConfig::from_env(), RouterConfig::from_env(), HubConfig::from_env())
}

pub fn rocket_with_config(
    floor_config: FloorControlConfig,
    router_config: RouterConfig,
    hub_config: HubConfig,
) -> rocket::Rocket<rocket::Build> {
    build_rocket(floor_config, router_config, hub_config)
}

fn build_rocket(
    floor_config: FloorControlConfig,
    router_config: RouterConfig,
    hub_config: HubConfig,
) -> rocket::Rocket<rocket::Build> {
    let hub = Arc::new(SubscriptionHub::new(hub_config));
    let floor_control = Arc::new(FloorControl::new(floor_config, publish_transitions_to(hub.clone())));
    let envelope_router = Arc::new(EnvelopeRouter::new(router_config));
    let manager = FloorManager::new(floor_control, hub, envelope_router);
    let directory = AgentDirectory::new();

    let cors_options = match cors_origins_from_env() {
        Some(origins) => CorsOptions {
            allowed_origins: AllowedOrigins::some_exact(&origins),
            ..CorsOptions::default()
        },
        None => CorsOptions::default(),
    };
    let cors = cors_options.to_cors().expect("Failed to create CORS");

    println!("🎙️  Floor Manager starting up");

    rocket::build()
        .manage(manager)
        .manage(directory)
        .attach(cors)
        .register("/", rocket::catchers![routes::not_found])
        .mount(
            "/",
            rocket::routes![
                routes::health,
                routes::send_envelope,
                routes::send_utterance,
                routes::validate_envelope,
                routes::request_floor,
                routes::release_floor,
                routes::get_holder,
                routes::floor_events,
                routes::floor_ws,
                routes::publish_manifests,
                routes::get_manifests,
                routes::search_manifests,
                routes::list_manifests,
            ],
        )
}
