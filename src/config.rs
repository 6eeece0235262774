use std::env;

/// What to do when a payment exceeds the current pending balance. The source
/// systems never agreed on this, so it is an explicit deployment choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverpaymentPolicy {
    /// Refuse the payment outright (default).
    Reject,
    /// Accept the payment and clamp pending to zero, ignoring the excess.
    Clamp,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub database_url: String,
    pub token_secret: String,
    pub token_ttl_secs: i64,
    pub uploads_dir: String,
    pub overpayment: OverpaymentPolicy,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let token_secret = env::var("TOKEN_SECRET").unwrap_or_else(|_| {
            log::error!("FATAL: TOKEN_SECRET environment variable not set");
            std::process::exit(1);
        });

        let overpayment = match env::var("OVERPAYMENT_POLICY").as_deref() {
            Ok("clamp") => OverpaymentPolicy::Clamp,
            _ => OverpaymentPolicy::Reject,
        };

        AppConfig {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://schooldesk.db".to_string()),
            token_secret,
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24 * 60 * 60),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            overpayment,
        }
    }
}
