use console::config::ConsoleConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    console::init_tracing();

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            std::process::exit(1);
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = console::build_state(config);
    console::runtime::start(&state);

    let app = console_server::routes::console_router(state);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, addr = %bind_addr, "bind failed");
            std::process::exit(1);
        }
    };

    info!(addr = %bind_addr, "console-server listening");
    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server stopped");
    }
}
