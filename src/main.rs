use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tpc_kvstore::config::{CoordinatorConfig, ReplicaConfig};
use tpc_kvstore::coordinator::Coordinator;
use tpc_kvstore::gateway;
use tpc_kvstore::network::SocketServer;
use tpc_kvstore::replica::KvServer;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kvstore", about = "Replicated key-value store with two-phase commit")]
struct Cli {
    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Run the coordinator
    Master {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8888)]
        port: u16,
        /// Replicas that must register before requests are served
        #[arg(long, default_value_t = 2)]
        slaves: usize,
        #[arg(long, default_value_t = 2)]
        redundancy: usize,
        #[arg(long, default_value_t = 4)]
        num_sets: usize,
        #[arg(long, default_value_t = 4)]
        elem_per_set: usize,
        #[arg(long, default_value_t = 8)]
        threads: usize,
        /// Also serve the HTTP gateway on this address
        #[arg(long)]
        http: Option<SocketAddr>,
    },
    /// Run a replica and register it with a coordinator
    Slave {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long)]
        port: u16,
        /// Coordinator address as host:port
        #[arg(long, default_value = "127.0.0.1:8888")]
        master: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 4)]
        num_sets: usize,
        #[arg(long, default_value_t = 4)]
        elem_per_set: usize,
        #[arg(long, default_value_t = 4)]
        threads: usize,
        /// Apply writes directly instead of taking part in two-phase commit
        #[arg(long)]
        standalone: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().role {
        Role::Master {
            host,
            port,
            slaves,
            redundancy,
            num_sets,
            elem_per_set,
            threads,
            http,
        } => {
            let config = CoordinatorConfig::new(slaves, redundancy)
                .with_cache(num_sets, elem_per_set)
                .with_max_threads(threads);
            run_master(config, &host, port, http).await
        }
        Role::Slave {
            host,
            port,
            master,
            data_dir,
            num_sets,
            elem_per_set,
            threads,
            standalone,
        } => {
            let dirname = data_dir.unwrap_or_else(|| PathBuf::from(format!("kvstore-{}", port)));
            let config = ReplicaConfig::new(dirname)
                .with_address(host, port)
                .with_cache(num_sets, elem_per_set)
                .with_max_threads(threads)
                .with_tpc(!standalone);
            run_slave(config, &master).await
        }
    }
}

async fn run_master(
    config: CoordinatorConfig,
    host: &str,
    port: u16,
    http: Option<SocketAddr>,
) -> anyhow::Result<()> {
    let max_threads = config.max_threads;
    tracing::info!(
        "Starting coordinator: {} replicas, redundancy {}",
        config.slave_capacity,
        config.redundancy
    );

    let coordinator = Arc::new(Coordinator::new(config)?);
    let server = SocketServer::new(coordinator.clone(), max_threads)
        .start(host, port)
        .await?;
    tracing::info!("Coordinator listening on {}", server.local_addr());

    if let Some(http_addr) = http {
        let listener = tokio::net::TcpListener::bind(http_addr).await?;
        tracing::info!("HTTP gateway listening on {}", http_addr);
        let app = gateway::router(coordinator.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("HTTP gateway stopped: {}", e);
            }
        });
    }

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(())
}

async fn run_slave(config: ReplicaConfig, master: &str) -> anyhow::Result<()> {
    let (master_host, master_port) = master
        .rsplit_once(':')
        .context("--master must be host:port")?;
    let master_port: u16 = master_port.parse().context("invalid master port")?;

    let max_threads = config.max_threads;
    let host = config.hostname.clone();
    let port = config.port;

    let replica = Arc::new(KvServer::open(config)?);
    let server = SocketServer::new(replica.clone(), max_threads)
        .start(&host, port)
        .await?;
    replica.set_port(server.port());
    tracing::info!("Replica listening on {}", server.local_addr());

    if replica.config().use_tpc {
        replica.register_master(master_host, master_port).await?;
    }

    tracing::info!("Press Ctrl+C to shutdown");
    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(())
}
