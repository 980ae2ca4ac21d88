use tokio::net::TcpListener;

/// Binds the configured port; on failure tries the next ten ports in
/// sequence; if all of those are busy, asks the OS for any free port.
pub async fn bind_with_fallback(port: u16) -> crate::error::Result<TcpListener> {
    for candidate in port..=port.saturating_add(10) {
        if let Ok(listener) = TcpListener::bind(("127.0.0.1", candidate)).await {
            return Ok(listener);
        }
    }
    TcpListener::bind(("127.0.0.1", 0))
        .await
        .map_err(|_| crate::error::DevServerError::NoFreePort)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_when_primary_port_is_taken() {
        let held = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let taken_port = held.local_addr().unwrap().port();

        let listener = bind_with_fallback(taken_port).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), taken_port);

        drop(held);
    }

    #[tokio::test]
    async fn binds_directly_when_port_is_free() {
        let listener = bind_with_fallback(0).await.unwrap();
        assert!(listener.local_addr().unwrap().port() > 0);
    }
}
