use leverage_server::config::Service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    leverage_server::start(Service::Ownership).await
}
