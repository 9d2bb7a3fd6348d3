use std::path::Path;
use std::sync::Arc;

mod cli;
mod config;
mod handler;
mod http;
mod logger;
mod server;

#[cfg(test)]
mod test_util;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = cli::parse_port_arg(std::env::args().skip(1))?;
    let cfg = config::Config::load(port)?;

    // Create the Tokio runtime, sizing the worker pool from the config
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|w| *w > 0) {
        runtime_builder.worker_threads(workers);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener =
        server::create_listener(addr).map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    if !Path::new(&cfg.server.root_directory).is_dir() {
        logger::log_warning(&format!(
            "Serving root '{}' does not exist, every request will be answered with 404",
            cfg.server.root_directory
        ));
    }

    let state = Arc::new(config::AppState::new(cfg));
    logger::log_server_start(&state.config);

    tokio::select! {
        () = server::start_server_loop(listener, state) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            logger::log_shutdown();
        }
    }

    Ok(())
}
