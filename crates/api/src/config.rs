use sherehe_whatsapp::client::WhatsAppConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development,
/// except the provider credentials which must be set explicitly.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// WhatsApp Cloud API connection settings.
    pub whatsapp: WhatsAppConfig,
    /// Token echoed back during the webhook verification handshake.
    pub webhook_verify_token: String,
    /// App secret used to verify `X-Hub-Signature-256` on Flow requests.
    pub app_secret: String,
    /// Secret the Flow endpoint key is derived from.
    pub flow_endpoint_secret: String,
    /// Fixed delay between consecutive campaign sends, in milliseconds
    /// (default: `1000`).
    pub campaign_send_delay_ms: u64,
    /// How long finished card batches are kept, in hours (default: `48`).
    pub card_batch_ttl_hours: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `HOST`                    | `0.0.0.0`                        |
    /// | `PORT`                    | `3000`                           |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                             |
    /// | `WHATSAPP_API_URL`        | `https://graph.facebook.com/v20.0` |
    /// | `WHATSAPP_ACCESS_TOKEN`   | (required)                       |
    /// | `WHATSAPP_PHONE_NUMBER_ID`| (required)                       |
    /// | `WHATSAPP_VERIFY_TOKEN`   | (required)                       |
    /// | `WHATSAPP_APP_SECRET`     | (required)                       |
    /// | `FLOW_ENDPOINT_SECRET`    | (required)                       |
    /// | `CAMPAIGN_SEND_DELAY_MS`  | `1000`                           |
    /// | `CARD_BATCH_TTL_HOURS`    | `48`                             |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let whatsapp = WhatsAppConfig {
            api_url: std::env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v20.0".into()),
            access_token: std::env::var("WHATSAPP_ACCESS_TOKEN")
                .expect("WHATSAPP_ACCESS_TOKEN must be set"),
            phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID")
                .expect("WHATSAPP_PHONE_NUMBER_ID must be set"),
        };

        let webhook_verify_token =
            std::env::var("WHATSAPP_VERIFY_TOKEN").expect("WHATSAPP_VERIFY_TOKEN must be set");
        let app_secret =
            std::env::var("WHATSAPP_APP_SECRET").expect("WHATSAPP_APP_SECRET must be set");
        let flow_endpoint_secret =
            std::env::var("FLOW_ENDPOINT_SECRET").expect("FLOW_ENDPOINT_SECRET must be set");

        let campaign_send_delay_ms: u64 = std::env::var("CAMPAIGN_SEND_DELAY_MS")
            .unwrap_or_else(|_| "1000".into())
            .parse()
            .expect("CAMPAIGN_SEND_DELAY_MS must be a valid u64");

        let card_batch_ttl_hours: i64 = std::env::var("CARD_BATCH_TTL_HOURS")
            .unwrap_or_else(|_| "48".into())
            .parse()
            .expect("CARD_BATCH_TTL_HOURS must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            whatsapp,
            webhook_verify_token,
            app_secret,
            flow_endpoint_secret,
            campaign_send_delay_ms,
            card_batch_ttl_hours,
        }
    }
}
