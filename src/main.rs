use parentbot::config::ChatConfig;

/// Bundled config for mobile and web builds
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

#[cfg(not(target_arch = "wasm32"))]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // The Dioxus launcher may install its own subscriber; the first one wins
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(target_arch = "wasm32")]
fn init_tracing() {}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ChatConfig::load(BUNDLED_CONFIG)?;
    tracing::info!(endpoint = %config.endpoint, "starting chat widget");

    dioxus::LaunchBuilder::new()
        .with_context(config)
        .launch(parentbot::ui::App);
    Ok(())
}
