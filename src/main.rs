use aloha::{App, Config, Logger, Server, TracingSink, hello};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "aloha=info".into()),
        )
        .init();

    let config = Config::from_env();
    let logger = Logger::new(TracingSink::new(config.log_level));
    let app = App::new(hello::routes(logger.clone()), logger);

    Server::bind(&config.addr).serve(app).await.expect("server error");
}
