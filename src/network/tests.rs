//! Network Module Tests
//!
//! ## Test Scopes
//! - **Dispatch**: requests reach the handler and responses reach the client.
//! - **Worker pool**: concurrent clients are all served; a busy pool queues connections.
//! - **Lifecycle**: a stopped server no longer accepts connections.

#[cfg(test)]
mod tests {
    use crate::error::KvError;
    use crate::network::{Handler, SocketServer};
    use crate::protocol::{CONNECT_TIMEOUT, Request, Response, connect_to, exchange, send_request};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;

    struct EchoHandler {
        served: AtomicUsize,
        delay: Duration,
    }

    impl EchoHandler {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                served: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl Handler for EchoHandler {
        async fn handle(&self, req: Request) -> Response {
            tokio::time::sleep(self.delay).await;
            self.served.fetch_add(1, Ordering::SeqCst);
            match req {
                Request::Get { key } => Response::GetResp {
                    value: key.to_uppercase(),
                    key,
                },
                _ => Response::Ack,
            }
        }
    }

    // ============================================================
    // DISPATCH TESTS
    // ============================================================

    #[tokio::test]
    async fn test_request_is_dispatched_to_handler() {
        let handler = EchoHandler::new(Duration::ZERO);
        let server = SocketServer::new(handler.clone(), 2)
            .start("127.0.0.1", 0)
            .await
            .unwrap();

        let resp = send_request("127.0.0.1", server.port(), &Request::get("abc"))
            .await
            .unwrap();

        assert_eq!(
            resp,
            Response::GetResp {
                key: "abc".to_string(),
                value: "ABC".to_string()
            }
        );
        assert_eq!(handler.served.load(Ordering::SeqCst), 1);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_garbage_request_gets_invalid_request() {
        let handler = EchoHandler::new(Duration::ZERO);
        let server = SocketServer::new(handler.clone(), 1)
            .start("127.0.0.1", 0)
            .await
            .unwrap();

        let mut stream = connect_to("127.0.0.1", server.port(), CONNECT_TIMEOUT)
            .await
            .unwrap();
        stream.write_all(&4u32.to_be_bytes()).await.unwrap();
        stream.write_all(&[0xff, 0xff, 0xff, 0xff]).await.unwrap();

        let resp: Response = crate::protocol::read_frame(&mut stream).await.unwrap();
        assert_eq!(resp, Response::error(&KvError::InvalidRequest));
        assert_eq!(handler.served.load(Ordering::SeqCst), 0);
        server.stop().await;
    }

    // ============================================================
    // WORKER POOL TESTS
    // ============================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_clients_all_served() {
        let handler = EchoHandler::new(Duration::from_millis(20));
        let server = SocketServer::new(handler.clone(), 4)
            .start("127.0.0.1", 0)
            .await
            .unwrap();
        let port = server.port();

        let mut clients = Vec::new();
        for i in 0..16 {
            clients.push(tokio::spawn(async move {
                send_request("127.0.0.1", port, &Request::get(format!("k{}", i))).await
            }));
        }

        for client in clients {
            let resp = client.await.unwrap().unwrap();
            assert!(matches!(resp, Response::GetResp { .. }));
        }
        assert_eq!(handler.served.load(Ordering::SeqCst), 16);
        server.stop().await;
    }

    #[tokio::test]
    async fn test_single_worker_queues_connections() {
        let handler = EchoHandler::new(Duration::from_millis(50));
        let server = SocketServer::new(handler.clone(), 1)
            .start("127.0.0.1", 0)
            .await
            .unwrap();
        let port = server.port();

        let a = tokio::spawn(async move { send_request("127.0.0.1", port, &Request::Commit).await });
        let b = tokio::spawn(async move { send_request("127.0.0.1", port, &Request::Abort).await });

        assert_eq!(a.await.unwrap().unwrap(), Response::Ack);
        assert_eq!(b.await.unwrap().unwrap(), Response::Ack);
        assert_eq!(handler.served.load(Ordering::SeqCst), 2);
        server.stop().await;
    }

    // ============================================================
    // LIFECYCLE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_stopped_server_refuses_connections() {
        let handler = EchoHandler::new(Duration::ZERO);
        let server = SocketServer::new(handler, 1)
            .start("127.0.0.1", 0)
            .await
            .unwrap();
        let port = server.port();
        server.stop().await;

        let mut stream = match connect_to("127.0.0.1", port, Duration::from_millis(200)).await {
            Err(KvError::ConnectionFailure(_)) => return,
            Err(e) => panic!("unexpected error: {}", e),
            Ok(stream) => stream,
        };

        // If the OS still completed the handshake, nobody answers
        let result = exchange(&mut stream, &Request::Info, Duration::from_millis(200)).await;
        assert!(result.is_err());
    }
}
