pub(crate) mod cli;
pub(crate) mod data;
pub(crate) mod entity;
pub(crate) mod server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    cli::run().await
}
