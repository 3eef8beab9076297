use anyhow::Context;

// Entry point when running `cargo run -p web-server`. Reads `config.toml` from the
// working directory and serves the API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = configuration::load_config("config.toml").context("loading configuration")?;
    let _guard = configuration::init_tracing(&settings.logging)?;
    web_server::run_server(&settings).await
}
