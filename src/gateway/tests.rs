//! Gateway Module Tests
//!
//! ## Test Scopes
//! - **Routes**: GET/PUT/DELETE on `/kv/:key` and GET `/info` against a live coordinator
//!   backed by a real replica.
//! - **Status mapping**: missing keys, oversized keys and an unfilled ring.

#[cfg(test)]
mod tests {
    use crate::config::{CoordinatorConfig, ReplicaConfig};
    use crate::coordinator::Coordinator;
    use crate::error::{KvError, MSG_SUCCESS};
    use crate::gateway::protocol::{MessageBody, PutBody, ValueBody};
    use crate::gateway::router;
    use crate::network::{ServerHandle, SocketServer};
    use crate::replica::KvServer;
    use crate::storage::MAX_KEYLEN;
    use reqwest::StatusCode;
    use std::sync::Arc;
    use tempfile::TempDir;

    const LOCALHOST: &str = "127.0.0.1";

    struct Gateway {
        base: String,
        client: reqwest::Client,
        _master: ServerHandle,
        _replica: Option<ServerHandle>,
        _dir: TempDir,
    }

    async fn start_gateway(slave_capacity: usize, replicas: usize) -> Gateway {
        let coordinator = Arc::new(
            Coordinator::new(CoordinatorConfig::new(slave_capacity, 1).with_cache(2, 2)).unwrap(),
        );
        let master = SocketServer::new(coordinator.clone(), 2)
            .start(LOCALHOST, 0)
            .await
            .unwrap();

        let dir = TempDir::new().unwrap();
        let mut replica = None;
        if replicas > 0 {
            let config = ReplicaConfig::new(dir.path().join("replica"))
                .with_address(LOCALHOST, 0)
                .with_cache(2, 2);
            let server = Arc::new(KvServer::open(config).unwrap());
            let handle = SocketServer::new(server.clone(), 2)
                .start(LOCALHOST, 0)
                .await
                .unwrap();
            server.set_port(handle.port());
            server.register_master(LOCALHOST, master.port()).await.unwrap();
            replica = Some(handle);
        }

        let listener = tokio::net::TcpListener::bind((LOCALHOST, 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(coordinator)).await.unwrap();
        });

        Gateway {
            base: format!("http://{}", addr),
            client: reqwest::Client::new(),
            _master: master,
            _replica: replica,
            _dir: dir,
        }
    }

    impl Gateway {
        fn kv(&self, key: &str) -> String {
            format!("{}/kv/{}", self.base, key)
        }

        async fn put(&self, key: &str, value: &str) -> (StatusCode, MessageBody) {
            let resp = self
                .client
                .put(self.kv(key))
                .json(&PutBody {
                    value: serde_json::Value::String(value.to_string()),
                })
                .send()
                .await
                .unwrap();
            let status = resp.status();
            (status, resp.json().await.unwrap())
        }
    }

    // ============================================================
    // ROUTE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_put_then_get() {
        let gateway = start_gateway(1, 1).await;

        let (status, body) = gateway.put("winteriscoming", "brr").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, MSG_SUCCESS);

        let resp = gateway.client.get(gateway.kv("winteriscoming")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body: ValueBody = resp.json().await.unwrap();
        assert_eq!(
            body,
            ValueBody {
                key: "winteriscoming".to_string(),
                value: "brr".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_then_get_missing() {
        let gateway = start_gateway(1, 1).await;
        gateway.put("iamyourfather", "noooooooo").await;

        let resp = gateway.client.delete(gateway.kv("iamyourfather")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = gateway.client.get(gateway.kv("iamyourfather")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: MessageBody = resp.json().await.unwrap();
        assert_eq!(body.message, KvError::NoSuchKey.to_string());
    }

    #[tokio::test]
    async fn test_put_structured_value_stored_as_json_text() {
        let gateway = start_gateway(1, 1).await;

        let resp = gateway
            .client
            .put(gateway.kv("book"))
            .json(&serde_json::json!({ "value": { "title": "Dune", "year": 1965 } }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: ValueBody = gateway
            .client
            .get(gateway.kv("book"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let stored: serde_json::Value = serde_json::from_str(&body.value).unwrap();
        assert_eq!(stored, serde_json::json!({ "title": "Dune", "year": 1965 }));
    }

    #[tokio::test]
    async fn test_info_lists_replica() {
        let gateway = start_gateway(1, 1).await;

        let resp = gateway
            .client
            .get(format!("{}/info", gateway.base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body: MessageBody = resp.json().await.unwrap();
        assert!(body.message.starts_with("TIMESTAMP: "));
        assert!(body.message.contains("Slaves:\n{127.0.0.1, "));
    }

    // ============================================================
    // STATUS MAPPING TESTS
    // ============================================================

    #[tokio::test]
    async fn test_oversized_key_is_bad_request() {
        let gateway = start_gateway(1, 1).await;
        let key = "k".repeat(MAX_KEYLEN + 1);

        let (status, body) = gateway.put(&key, "v").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.message, KvError::KeyTooLong.to_string());
    }

    #[tokio::test]
    async fn test_unfilled_ring_is_conflict() {
        let gateway = start_gateway(2, 1).await;

        let (status, body) = gateway.put("key1", "value1").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.message, KvError::Generic.to_string());

        let resp = gateway.client.get(gateway.kv("key1")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
