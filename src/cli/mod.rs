use crate::data::configuration::Configuration;
use crate::data::dbconnector::{CatalogConnection, SQLConnector};
use crate::server;
use clap::Parser;
use log::{debug, info};
use std::env;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
    #[arg(short, long, default_value_t = String::from("configuration.toml"))]
    configuration_path: String,
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    debug!("Configuration path: {}", args.configuration_path);
    let config = Configuration::load(&args.configuration_path)?;
    debug!("Loaded configuration: {config:?}");

    // PORT wins over the flag, matching the deployment environment contract
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(args.port);

    // Check the database connection
    let mut db_connector = SQLConnector::new(&config.database_url());
    db_connector.connect().await?;
    db_connector.check().await?;
    // Has the database been initialised ?
    if db_connector.is_initialized().await? {
        info!("Database is initialized");
    } else {
        info!("Database is not initialized, performing initialization");
        db_connector.initialize(&config).await?;
    }
    // Start the server
    server::run(config, db_connector, port).await
}
