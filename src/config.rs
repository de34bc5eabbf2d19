use std::env;

/// Floor Control tunables (spec §4.B). All read from environment variables
/// with sensible defaults, mirroring `rate_limit::RateLimitConfig::from_env`.
///
/// Environment variables:
/// - `FLOOR_TIMEOUT` — reserved; read but unused, the core state machine has
///   no durable "requested" state to expire (§4.B "Intermediate 'requested'
///   is not a durable state") (default: 30)
/// - `FLOOR_MAX_HOLD_TIME` — seconds a grant is held before auto-yield (default: 300)
/// - `FLOOR_QUEUE_MAX_SIZE` — max pending requests per conversation (default: 100)
#[derive(Debug, Clone)]
pub struct FloorControlConfig {
    pub request_timeout_secs: u64,
    pub max_hold_secs: u64,
    pub queue_max_size: usize,
}

impl Default for FloorControlConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_hold_secs: 300,
            queue_max_size: 100,
        }
    }
}

impl FloorControlConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("FLOOR_TIMEOUT")
            && let Ok(n) = val.parse::<u64>()
        {
            config.request_timeout_secs = n;
        }
        if let Ok(val) = env::var("FLOOR_MAX_HOLD_TIME")
            && let Ok(n) = val.parse::<u64>()
        {
            config.max_hold_secs = n;
        }
        if let Ok(val) = env::var("FLOOR_QUEUE_MAX_SIZE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.queue_max_size = n;
        }

        config
    }
}

/// Envelope Router tunables (spec §4.D/§5).
///
/// Environment variables:
/// - `ROUTER_MAX_RETRIES` — reserved; read but unused, retries are a caller concern (default: 3)
/// - `ROUTER_TIMEOUT` — `perDeliveryTimeout`, in **seconds** (default: 10)
/// - `ROUTER_QUEUE_SIZE` — router dispatch queue cap: max deliveries in
///   flight at once before new ones are rejected with backpressure (default: 1000)
#[derive(Debug, Clone)]
pub struct RouterConfig {
    pub max_retries: u32,
    pub delivery_timeout_ms: u64,
    pub queue_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delivery_timeout_ms: 10_000,
            queue_size: 1000,
        }
    }
}

impl RouterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("ROUTER_MAX_RETRIES")
            && let Ok(n) = val.parse::<u32>()
        {
            config.max_retries = n;
        }
        if let Ok(val) = env::var("ROUTER_TIMEOUT")
            && let Ok(n) = val.parse::<u64>()
        {
            config.delivery_timeout_ms = n * 1000;
        }
        if let Ok(val) = env::var("ROUTER_QUEUE_SIZE")
            && let Ok(n) = val.parse::<usize>()
        {
            config.queue_size = n;
        }

        config
    }
}

/// Subscription Hub tunables (spec §4.C/§5) — the per-subscriber transition
/// buffer cap, distinct from `RouterConfig::queue_size` (the router's
/// dispatch-queue cap): spec §5 lists them as two separate bounded queues
/// (64 vs 1000) and no environment variable is named for this one, so it
/// only ever takes its default.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self { channel_capacity: 64 }
    }
}

impl HubConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// CORS origins, a comma-separated list via `CORS_ORIGINS` (default: allow all,
/// matching the teacher's unconfigured `CorsOptions::default()`).
pub fn cors_origins_from_env() -> Option<Vec<String>> {
    env::var("CORS_ORIGINS").ok().map(|val| {
        val.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
