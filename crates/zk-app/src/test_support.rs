use axum::Router;

/// What a mock generation endpoint saw in one multipart request
#[derive(Debug, Default, Clone)]
pub struct Received {
    pub text: Option<String>,
    /// (filename, content type, byte count) per `images` part
    pub images: Vec<(String, Option<String>, usize)>,
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
