#[tokio::main]
async fn main() {
    transcriber_backend::run().await;
}
