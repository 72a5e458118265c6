//! Relay server binary
//!
//! Run with: relay-server [PORT]
//!
//! Examples:
//!   relay-server                              # binds to 0.0.0.0:7117
//!   relay-server 8080                         # binds to 0.0.0.0:8080
//!   relay-server --host 127.0.0.1 7118        # binds to 127.0.0.1:7118
//!   relay-server --overflow disconnect        # drop subscribers that fall behind
//!
//! ## Register an application
//!
//!   curl -d '{"userAgent":"demo","host":"localhost"}' http://localhost:7117/clients
//!
//! ## Observe
//!
//!   curl -N http://localhost:7117/events/0
//!
//! ## Publish
//!
//!   curl -d '{"count":1}' http://localhost:7117/events/0
//!   curl -d '{"type":"reset"}' http://localhost:7117/actions/0

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;

use relay_rs::registry::{OverflowPolicy, RegistryConfig, MAX_SUBSCRIBER_CAPACITY};
use relay_rs::server::config::DEFAULT_PORT;
use relay_rs::{RelayServer, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "relay-server", version, about = "Pub/sub relay over HTTP event streams")]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Envelopes a subscriber may fall behind before the overflow policy applies,
    /// rounded up to a power of two
    #[arg(
        long,
        default_value_t = 64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SUBSCRIBER_CAPACITY as u64)
    )]
    subscriber_capacity: u64,

    /// What to do with a subscriber that falls behind: drop-oldest or disconnect
    #[arg(long, default_value_t = OverflowPolicy::DropOldest)]
    overflow: OverflowPolicy,

    /// Seconds between keep-alive comments on idle streams (0 disables)
    #[arg(long, default_value_t = 15)]
    keep_alive_secs: u64,

    /// Do not send CORS headers
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_rs=debug,relay_server=debug,tower_http=info".into()),
        )
        .init();

    let mut config = ServerConfig::with_addr(SocketAddr::new(args.host, args.port))
        .keep_alive(Duration::from_secs(args.keep_alive_secs));
    if args.no_cors {
        config = config.disable_cors();
    }

    let registry_config = RegistryConfig::default()
        .subscriber_capacity(args.subscriber_capacity as usize)
        .overflow_policy(args.overflow);

    tracing::info!(
        addr = %config.bind_addr,
        subscriber_capacity = registry_config.subscriber_capacity,
        overflow = %registry_config.overflow_policy,
        "Starting relay server"
    );

    let server = RelayServer::with_registry_config(config, registry_config);

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
