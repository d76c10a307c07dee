use axum::body::Body;
use axum::extract::Request;
use axum::http::Response;
use axum::middleware::Next;
use tokio::time::Instant;

pub async fn request(request: Request, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let started = Instant::now();

    tracing::info!("Received a request! [Endpoint: {} {}]", method, uri);

    let response = next.run(request).await;

    tracing::info!(
        "Finished a request! [Endpoint: {} {}] [Status: {}] [Took: {}ms]",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );

    response
}
