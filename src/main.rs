use tabletop_content_store::rocket_initialize;

#[rocket::main]
async fn main() -> Result<(), rocket::Error> {
    let _rocket = rocket_initialize().launch().await?;
    Ok(())
}
