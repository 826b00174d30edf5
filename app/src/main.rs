#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hubswap_lib::run().await
}
