//! Main application entry point (native).

#[cfg(feature = "native")]
fn main() {
    env_logger::init();
    log::info!("Starting InkSync");

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "native")]
fn run() -> Result<(), inksync_app::AppError> {
    use inksync_core::NativeWebSocket;
    use std::time::Duration;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = inksync_app::resolve_config(&args, |key| std::env::var(key).ok())?;
    let url = config.server_url().ok_or(inksync_app::AppError::MissingServer)?;

    let mut ws = NativeWebSocket::new();
    ws.connect(&url)?;

    let summary =
        inksync_app::replay_board(&mut ws, &config, inksync_app::DEFAULT_WIDTH, Duration::from_secs(10))?;
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to encode summary: {}", e),
    }

    ws.disconnect();
    Ok(())
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
