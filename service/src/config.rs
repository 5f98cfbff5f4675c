use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default Nylas v3 API base URL used when `NYLAS_BASE_URL` is not set.
pub const DEFAULT_NYLAS_BASE_URL: &str = "https://api.us.nylas.com/v3";

/// Code verifier sent on the token exchange when the callback carries no OAuth `state`.
pub const DEFAULT_PKCE_FALLBACK_VERIFIER: &str = "nylas";

pub const DEFAULT_API_VERSION: &str = "1.0.0";
// Expand this array to include all valid API versions. Versions that have been
// completely removed should be removed from this list - they're no longer valid.
pub const API_VERSIONS: [&str; 1] = [DEFAULT_API_VERSION];

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Set the current semantic version of the endpoint API to expose to clients.
    #[arg(short, long, env, default_value = DEFAULT_API_VERSION,
        value_parser = clap::builder::PossibleValuesParser::new(API_VERSIONS)
            .map(|s| s.parse::<String>().unwrap()),
        )]
    pub api_version: Option<String>,

    /// The public base URL of this application. The OAuth redirect URI is derived from it.
    #[arg(long, env, default_value = "http://localhost:3000")]
    base_url: String,

    /// The base URL of the Nylas v3 API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_NYLAS_BASE_URL)]
    nylas_base_url: String,

    /// The server-side API key used as the bearer credential for every Nylas call.
    #[arg(long, env)]
    nylas_api_key: Option<String>,

    /// The Nylas application client ID used for hosted authentication.
    #[arg(long, env)]
    nylas_client_id: Option<String>,

    /// PKCE verifier to send when an auth callback arrives without a `state` parameter.
    #[arg(long, env, default_value = DEFAULT_PKCE_FALLBACK_VERIFIER)]
    pkce_fallback_verifier: String,

    /// Shared secret expected in the `x-webhook-secret` header of incoming webhooks.
    #[arg(long, env)]
    webhook_secret: Option<String>,

    /// Key used to sign recording download tokens.
    #[arg(long, env)]
    download_token_secret: Option<String>,

    /// Lifetime in seconds of a signed recording download token
    #[arg(long, env, default_value_t = 900)]
    pub download_token_ttl_secs: u64,

    /// Seconds a recording retrieval job is kept after creation before it is evicted
    #[arg(long, env, default_value_t = 3600)]
    pub job_retention_secs: u64,

    /// How often, in seconds, expired retrieval jobs are swept from memory
    #[arg(long, env, default_value_t = 60)]
    pub job_sweep_interval_secs: u64,

    /// Extra attempts the retrieval worker makes when the recording is not available yet.
    /// Zero surfaces the first "not found" straight to the polling client.
    #[arg(long, env, default_value_t = 0)]
    pub media_not_found_retries: u32,

    /// Timeout in seconds for a single upstream API request
    #[arg(long, env, default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Retries applied to transient failures of idempotent upstream reads
    #[arg(long, env, default_value_t = 2)]
    pub upstream_max_retries: u32,

    /// Days a grant session stays valid after sign-in, regardless of activity
    #[arg(long, env, default_value_t = 30)]
    pub session_expiry_days: i64,

    /// Seconds to wait for outstanding retrieval workers during shutdown
    #[arg(long, env, default_value_t = 10)]
    pub shutdown_grace_secs: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        // Defaults and environment only; never the host process's command line.
        Config::parse_from([env!("CARGO_PKG_NAME")])
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// The redirect URI registered with Nylas for hosted authentication.
    pub fn redirect_uri(&self) -> String {
        format!("{}/auth-success.html", self.base_url())
    }

    pub fn nylas_base_url(&self) -> &str {
        self.nylas_base_url.trim_end_matches('/')
    }

    pub fn set_nylas_base_url(mut self, nylas_base_url: String) -> Self {
        self.nylas_base_url = nylas_base_url;
        self
    }

    pub fn nylas_api_key(&self) -> Option<String> {
        self.nylas_api_key.clone()
    }

    pub fn set_nylas_api_key(mut self, nylas_api_key: String) -> Self {
        self.nylas_api_key = Some(nylas_api_key);
        self
    }

    pub fn nylas_client_id(&self) -> Option<String> {
        self.nylas_client_id.clone()
    }

    pub fn set_nylas_client_id(mut self, nylas_client_id: String) -> Self {
        self.nylas_client_id = Some(nylas_client_id);
        self
    }

    pub fn pkce_fallback_verifier(&self) -> &str {
        &self.pkce_fallback_verifier
    }

    pub fn webhook_secret(&self) -> Option<String> {
        self.webhook_secret.clone()
    }

    pub fn set_webhook_secret(mut self, webhook_secret: String) -> Self {
        self.webhook_secret = Some(webhook_secret);
        self
    }

    pub fn download_token_secret(&self) -> Option<String> {
        self.download_token_secret.clone()
    }

    pub fn set_download_token_secret(mut self, secret: String) -> Self {
        self.download_token_secret = Some(secret);
        self
    }

    pub fn download_token_ttl(&self) -> Duration {
        Duration::from_secs(self.download_token_ttl_secs)
    }

    pub fn job_retention(&self) -> Duration {
        Duration::from_secs(self.job_retention_secs)
    }

    pub fn job_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.job_sweep_interval_secs.max(1))
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }

    /// Session cookies are only marked `Secure` outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.runtime_env() != RustEnv::Development
    }
}
