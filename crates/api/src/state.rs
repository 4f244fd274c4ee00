use std::sync::Arc;

use sherehe_whatsapp::client::WhatsAppClient;
use sherehe_whatsapp::flow::FlowCodec;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sherehe_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WhatsApp Cloud API client.
    pub whatsapp: Arc<WhatsAppClient>,
    /// Flow signature/encryption codec.
    pub flow_codec: Arc<FlowCodec>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<sherehe_events::bus::EventBus>,
}
