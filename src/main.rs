use log::{error, info};

use lightchat::config::ServerConfig;
use lightchat::server::ChatServer;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::default();
    let server = match ChatServer::bind(config.clone()).await {
        Ok(s) => s,
        Err(e) => {
            error!("failed to bind {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };

    match server.local_addr() {
        Ok(addr) => info!("listening on ws://{}", addr),
        Err(e) => info!("listening on {} ({})", config.addr, e),
    }

    if let Err(e) = server.run().await {
        error!("{}", e);
    }
}
