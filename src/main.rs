#[tokio::main]
async fn main() {
    dispatch_backend::run().await;
}
