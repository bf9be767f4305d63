use nexray_http::{ClientConfig, Form, NexrayClient, Payload};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("NEXRAY_CONFIG") {
        Ok(path) => ClientConfig::from_path(path)?,
        Err(_) => ClientConfig::new(std::env::var("NEXRAY_BASE_URL")?),
    };

    let mut client = NexrayClient::new(config)?;
    if let Ok(token) = std::env::var("NEXRAY_TOKEN") {
        client.set_auth_token(&token)?;
    }

    match client.get("/health", ()).await? {
        Payload::Json(value) => println!("health: {value}"),
        Payload::Bytes(bytes) => println!("health: {} byte(s)", bytes.len()),
    }

    let form = Form::new()
        .text("prompt", "a cat")
        .field("style", None::<nexray_http::FormValue>);
    let result = client.post_form("/generate", form).await?;
    println!("generate: {result:?}");

    let image = client.get_buffer("/render", [("text", "hello")]).await?;
    std::fs::write("render.bin", &image)?;
    println!("saved {} byte(s) to render.bin", image.len());

    Ok(())
}
