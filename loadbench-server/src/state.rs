//! Application state shared across handlers.

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::nats_publisher::NatsPublisher;

pub struct AppState {
    pub pool: PgPool,
    pub nats: NatsPublisher,
    pub config: ServerConfig,
}
