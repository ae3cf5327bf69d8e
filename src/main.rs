use log::{error, info};
use yunmeng::configuration::Configuration;
use yunmeng::web_interface::MockServer;

#[tokio::main]
async fn main() {
    // https://docs.rs/env_logger/latest/env_logger/
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .init();

    println!(
        "
==============================================================================
              Yunmeng mock API server v{}
==============================================================================
",
        env!("CARGO_PKG_VERSION")
    );

    info!("Importing configuration");
    let args = Configuration::from_args();
    let config = match args.load() {
        Ok(config) => config,
        Err(e) => {
            error!("Unable to import configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration imported successfully");

    let server = MockServer::new(&config.server);
    if let Err(e) = server.start().await {
        error!("Mock server stopped: {}, exiting...", e);
        std::process::exit(1);
    }
}
