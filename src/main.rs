#[rocket::main]
async fn main() {
    if let Err(e) = floor_manager::rocket().launch().await {
        eprintln!("⚠️  Floor Manager failed to launch: {e}");
    }
}
