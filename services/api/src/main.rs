#[tokio::main]
async fn main() {
    if let Err(err) = stay_ops_api::run().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}
