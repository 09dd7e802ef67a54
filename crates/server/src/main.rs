#[tokio::main]
async fn main() -> anyhow::Result<()> {
    odoscan_server::telemetry::init("odoscan-server");

    let config = odoscan_server::load_config(None)?;
    odoscan_server::serve(config).await
}
