//! jfeed gateway - HTTP front for the jfeed news site.
//!
//! Answers redirect/404 decisions for page paths and serves the assembled home
//! feed, backed by the upstream CMS.

use anyhow::Result;
use clap::Parser;
use jfeed_core::{config::AppConfig, GatewayConfig, JfeedApi};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "jfeed-gateway")]
#[command(about = "Redirect resolution and home feed gateway for jfeed")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, env = "JFEED_PORT", default_value_t = AppConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "JFEED_HOST", default_value = AppConfig::DEFAULT_HOST)]
    host: String,

    /// CMS API base URL
    #[arg(long, env = "JFEED_CMS_URL")]
    cms_url: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "JFEED_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// How long found entities stay cached, in seconds
    #[arg(long, env = "JFEED_POSITIVE_TTL_SECS")]
    positive_ttl_secs: Option<u64>,

    /// How long missing entities stay cached, in seconds
    #[arg(long, env = "JFEED_NEGATIVE_TTL_SECS")]
    negative_ttl_secs: Option<u64>,

    /// Maximum lookup cache entries
    #[arg(long, env = "JFEED_CACHE_MAX_ENTRIES")]
    cache_max_entries: Option<usize>,

    /// How long an assembled home feed is reused, in seconds
    #[arg(long, env = "JFEED_FEED_TTL_SECS")]
    feed_ttl_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, env = "JFEED_DEBUG")]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "JFEED_LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        let defaults = GatewayConfig::default();
        GatewayConfig {
            host: self.host,
            port: self.port,
            cms_base_url: self.cms_url.unwrap_or(defaults.cms_base_url),
            request_timeout: self
                .timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            positive_ttl: self
                .positive_ttl_secs
                .map_or(defaults.positive_ttl, Duration::from_secs),
            negative_ttl: self
                .negative_ttl_secs
                .map_or(defaults.negative_ttl, Duration::from_secs),
            cache_max_entries: self.cache_max_entries.unwrap_or(defaults.cache_max_entries),
            feed_ttl: self
                .feed_ttl_secs
                .map_or(defaults.feed_ttl, Duration::from_secs),
        }
    }
}

fn init_logging(debug: bool, json: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log_json);

    info!("Starting {}", AppConfig::APP_NAME);

    let config = args.into_config();
    info!("CMS base URL: {}", config.cms_base());

    let host = config.host.clone();
    let port = config.port;
    let api = JfeedApi::new(config)?;

    let (addr, server) = jfeed_gateway::start_server(api, &host, port).await?;

    // Intentional stdout so process supervisors can read the bound port.
    println!("JFEED_PORT={}", addr.port());

    info!("Gateway running on {}", addr);

    server.await?;
    info!("Gateway stopped");

    Ok(())
}
