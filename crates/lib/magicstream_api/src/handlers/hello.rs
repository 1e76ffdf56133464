//! Liveness endpoint.

/// `GET /hello`: plain-text liveness check.
pub async fn hello_world() -> String {
    format!("Hello from magicstream_api v{}", env!("CARGO_PKG_VERSION"))
}
