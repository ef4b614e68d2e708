#[tokio::main]
async fn main() {
    if let Err(e) = batchmv_bot::run().await {
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
