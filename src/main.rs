#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    event_guest_backend::run().await;
}
