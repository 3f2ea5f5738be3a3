//! Optional HTTP health page.

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tracing::info;

const PAGE: &str =
    "<h2>Couplebot Web Service Active!</h2><p>Bot running with Telegram long polling.</p>";

/// Serve the static confirmation page on `0.0.0.0:<port>` until the
/// process exits.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let app = Router::new().route("/", get(home));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Health endpoint listening on port {port}");
    axum::serve(listener, app).await
}

async fn home() -> Html<&'static str> {
    Html(PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_home_serves_static_page() {
        let Html(body) = home().await;
        assert!(body.contains("Couplebot Web Service Active!"));
    }
}
