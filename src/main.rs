#[actix_web::main]
async fn main() -> std::io::Result<()> {
    docform::run().await
}
