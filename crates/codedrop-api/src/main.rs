use codedrop_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    // Content area, store, sweep task and routes
    let app = codedrop_api::setup::initialize_app(config.clone()).await?;

    let served = codedrop_api::setup::server::start_server(&config, app.router.clone()).await;

    // Nothing survives a restart, so remaining content goes with the process,
    // whether the server stopped cleanly or failed
    app.shutdown().await;

    served
}
