pub mod ams;
pub mod runtime;

pub use ams::AmsQuerier;
pub use runtime::RuntimeRestResolver;

use url::Url;

/// Treat the configured endpoint as a directory so relative API paths are
/// joined under it instead of replacing its last segment.
pub(crate) fn base_endpoint(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

/// Canned HTTP/1.1 server for exercising the transports' error paths.
#[cfg(test)]
pub(crate) mod stub {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    pub(crate) struct StubServer {
        pub url: Url,
        hits: Arc<AtomicUsize>,
    }

    impl StubServer {
        pub(crate) fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    /// Answer every request with `status` and `body`, closing the connection
    /// after each response.
    pub(crate) async fn serve(status: u16, body: &'static str) -> StubServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        StubServer {
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
            hits,
        }
    }

    /// An address nothing listens on.
    pub(crate) async fn closed_port() -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{addr}/")).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_endpoint_keeps_last_segment() {
        let base = base_endpoint(Url::parse("http://collector:6188/ams").unwrap());
        assert_eq!(
            base.join("ws/v1/timeline/metrics").unwrap().as_str(),
            "http://collector:6188/ams/ws/v1/timeline/metrics"
        );
    }

    #[test]
    fn test_base_endpoint_leaves_directory_untouched() {
        let base = base_endpoint(Url::parse("http://runtime:8744/").unwrap());
        assert_eq!(base.as_str(), "http://runtime:8744/");
    }
}
