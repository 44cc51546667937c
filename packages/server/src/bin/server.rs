//! Real-time connection gateway server.
//!
//! Admits WebSocket clients under a capacity bound, authorizes inbound
//! operations against a role-based policy, throttles senders with a
//! sliding-window rate limit, and fans messages out to channel subscribers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin torii-server
//! cargo run --bin torii-server -- --host 0.0.0.0 --port 3000 --config gateway.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use torii_server::{
    config::GatewayConfig,
    domain::{AccessPolicy, GatewayStats, Role},
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        rate_limiter::SlidingWindowRateLimiter,
        repository::{InMemoryChannelIndex, InMemoryConnectionRegistry},
    },
    ui::Server,
    usecase::{
        ConnectClientUseCase, DisconnectClientUseCase, RouteMessageUseCase, UpdatePolicyUseCase,
    },
};
use torii_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "torii-server")]
#[command(about = "Real-time connection gateway", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Path to a JSON configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Override the configured global admission bound
    #[arg(long)]
    max_connections: Option<usize>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let mut config = match GatewayConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(max_connections) = args.max_connections {
        config.max_connections = max_connections;
    }

    let policy_tables = match config.policy_tables() {
        Ok(tables) => tables,
        Err(e) => {
            tracing::error!("Invalid role mapping in configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Stats + Clock
    // 2. Repository + ChannelIndex
    // 3. MessagePusher + RateLimiter + AccessPolicy
    // 4. UseCases
    // 5. Server

    // 1. Create stats counters and the system clock
    let stats = Arc::new(GatewayStats::new());
    let clock = Arc::new(SystemClock);

    // 2. Create the connection registry and the channel index
    let repository = Arc::new(InMemoryConnectionRegistry::new(
        config.max_connections,
        stats.clone(),
        clock.clone(),
    ));
    let channel_index = Arc::new(InMemoryChannelIndex::new());

    // 3. Create the message pusher, the rate limiter, and the access policy
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(
        config.rate_limit_mode,
        config.rate_limit_bypass,
        clock.clone(),
    ));
    let policy = Arc::new(AccessPolicy::new(policy_tables));
    tracing::info!(
        "Gateway configured (max_connections: {}, mode: {:?})",
        config.max_connections,
        config.rate_limit_mode
    );

    // 4. Create UseCases
    let connect_client_usecase = Arc::new(ConnectClientUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let disconnect_client_usecase = Arc::new(DisconnectClientUseCase::new(
        repository.clone(),
        channel_index.clone(),
        message_pusher.clone(),
    ));
    let route_message_usecase = Arc::new(RouteMessageUseCase::new(
        repository.clone(),
        channel_index.clone(),
        message_pusher.clone(),
        policy.clone(),
        rate_limiter.clone(),
        stats.clone(),
        clock.clone(),
        config.gateway_rate_limit,
    ));
    let admin_role = Role::new("admin".to_string()).expect("'admin' is a valid role");
    let update_policy_usecase = Arc::new(UpdatePolicyUseCase::new(
        policy.clone(),
        rate_limiter.clone(),
        config.api_rate_limit,
        admin_role,
    ));

    // 5. Create and run the server
    let server = Server::new(
        connect_client_usecase,
        disconnect_client_usecase,
        route_message_usecase,
        update_policy_usecase,
        stats,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
