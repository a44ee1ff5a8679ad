use tubely_core::Config;

// mimalloc keeps fragmentation down under many concurrent upload buffers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = tubely_api::setup::initialize_app(&config).await?;

    tubely_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
