use std::env;

const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_EMAIL_FROM: &str = "LesGo <noreply@lesgo.id>";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub base_url: String,
    pub search: SearchConfig,
    pub midtrans: MidtransConfig,
    pub email: EmailConfig,
    pub outbox: OutboxConfig,
    /// Lets a parent mark a booking paid without a gateway callback.
    pub allow_manual_payment: bool,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct MidtransConfig {
    pub server_key: String,
    pub is_production: bool,
    pub require_signature: bool,
    /// Overrides the Snap endpoint picked from `is_production`.
    pub snap_url: Option<String>,
}

impl MidtransConfig {
    pub fn snap_url(&self) -> &str {
        match &self.snap_url {
            Some(url) => url,
            None if self.is_production => "https://app.midtrans.com/snap/v1/transactions",
            None => "https://app.sandbox.midtrans.com/snap/v1/transactions",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct OutboxConfig {
    pub poll_secs: u64,
    pub max_attempts: i32,
    pub batch_size: u64,
    /// Deliver freshly enqueued notifications right after the transaction commits.
    pub dispatch_on_commit: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT").unwrap_or(3000);
        let base_url =
            env::var("APP_BASE_URL").unwrap_or_else(|_| format!("http://localhost:{port}"));

        let is_production = parse_bool("MIDTRANS_IS_PRODUCTION").unwrap_or(false);
        let midtrans = MidtransConfig {
            server_key: env::var("MIDTRANS_SERVER_KEY").unwrap_or_default(),
            is_production,
            require_signature: parse_bool("MIDTRANS_REQUIRE_SIGNATURE").unwrap_or(false),
            snap_url: env::var("MIDTRANS_SNAP_URL").ok().filter(|u| !u.trim().is_empty()),
        };

        let email = EmailConfig {
            api_key: env::var("EMAIL_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| DEFAULT_EMAIL_API_URL.to_string()),
            from: env::var("EMAIL_FROM").unwrap_or_else(|_| DEFAULT_EMAIL_FROM.to_string()),
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            base_url,
            search: SearchConfig {
                max_distance_km: parse_var("SEARCH_MAX_DISTANCE_KM").unwrap_or(15.0),
            },
            midtrans,
            email,
            outbox: OutboxConfig {
                poll_secs: parse_var("OUTBOX_POLL_SECS").unwrap_or(60),
                max_attempts: parse_var("OUTBOX_MAX_ATTEMPTS").unwrap_or(5),
                batch_size: 50,
                dispatch_on_commit: true,
            },
            allow_manual_payment: parse_bool("ALLOW_MANUAL_PAYMENT").unwrap_or(!is_production),
        })
    }

    /// Configuration for tests and tooling that never touches the network.
    pub fn for_tests() -> Self {
        Self {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "test-secret".into(),
            base_url: "http://localhost:3000".into(),
            search: SearchConfig {
                max_distance_km: 15.0,
            },
            midtrans: MidtransConfig {
                server_key: "SB-Mid-server-test".into(),
                is_production: false,
                require_signature: false,
                snap_url: None,
            },
            email: EmailConfig {
                api_key: None,
                api_url: DEFAULT_EMAIL_API_URL.into(),
                from: DEFAULT_EMAIL_FROM.into(),
            },
            outbox: OutboxConfig {
                poll_secs: 0,
                max_attempts: 5,
                batch_size: 50,
                dispatch_on_commit: false,
            },
            allow_manual_payment: true,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

fn parse_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}
