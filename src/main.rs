use evcc_dashboard::bootstrapper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bootstrapper::run().await
}
