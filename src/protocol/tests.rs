//! Protocol Module Tests
//!
//! ## Test Scopes
//! - **Framing**: messages survive a trip through a byte stream; oversized frames are refused.
//! - **Client**: connect failures are told apart from peers that never answer.
//! - **Messages**: helper constructors and the success/error message surface.

#[cfg(test)]
mod tests {
    use crate::error::{KvError, MSG_SUCCESS};
    use crate::protocol::{
        MAX_FRAME_LEN, Request, Response, connect_to, exchange, read_frame, write_frame,
    };
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    // ============================================================
    // FRAMING TESTS
    // ============================================================

    #[tokio::test]
    async fn test_frames_preserve_message_sequence() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        write_frame(&mut client, &Request::put("key", "value")).await.unwrap();
        write_frame(&mut client, &Request::Register {
            host: "localhost".to_string(),
            port: 8162,
        })
        .await
        .unwrap();
        write_frame(&mut client, &Request::Commit).await.unwrap();

        let first: Request = read_frame(&mut server).await.unwrap();
        let second: Request = read_frame(&mut server).await.unwrap();
        let third: Request = read_frame(&mut server).await.unwrap();

        assert_eq!(first, Request::put("key", "value"));
        assert_eq!(
            second,
            Request::Register {
                host: "localhost".to_string(),
                port: 8162
            }
        );
        assert_eq!(third, Request::Commit);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        client
            .write_all(&(MAX_FRAME_LEN + 1).to_be_bytes())
            .await
            .unwrap();

        let result: crate::error::Result<Request> = read_frame(&mut server).await;
        assert!(matches!(result, Err(KvError::Io(_))));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_an_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&10u32.to_be_bytes()).await.unwrap();
        client.write_all(&[1, 2, 3]).await.unwrap();
        drop(client);

        let result: crate::error::Result<Request> = read_frame(&mut server).await;
        assert!(result.is_err());
    }

    // ============================================================
    // CLIENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_connect_to_closed_port_is_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect_to("127.0.0.1", port, Duration::from_millis(200)).await;
        assert!(matches!(result, Err(KvError::ConnectionFailure(_))));
    }

    #[tokio::test]
    async fn test_silent_peer_times_out_without_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and hold the connection without ever answering
        let holder = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(socket);
        });

        let mut stream = connect_to("127.0.0.1", port, Duration::from_millis(500))
            .await
            .unwrap();
        let result = exchange(&mut stream, &Request::Info, Duration::from_millis(200)).await;

        assert!(matches!(result, Err(KvError::Io(_))));
        holder.abort();
    }

    #[tokio::test]
    async fn test_exchange_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let req: Request = read_frame(&mut socket).await.unwrap();
            let resp = match req {
                Request::Get { key } => Response::GetResp {
                    key,
                    value: "found".to_string(),
                },
                _ => Response::Ack,
            };
            write_frame(&mut socket, &resp).await.unwrap();
        });

        let mut stream = connect_to("127.0.0.1", port, Duration::from_millis(500))
            .await
            .unwrap();
        let resp = exchange(&mut stream, &Request::get("k"), Duration::from_secs(2))
            .await
            .unwrap();

        assert_eq!(
            resp,
            Response::GetResp {
                key: "k".to_string(),
                value: "found".to_string()
            }
        );
    }

    // ============================================================
    // MESSAGE TESTS
    // ============================================================

    #[test]
    fn test_response_messages() {
        assert_eq!(Response::success().message(), Some(MSG_SUCCESS));
        assert!(Response::success().is_success());

        let err = Response::error(&KvError::NoSuchKey);
        assert_eq!(err.message(), Some("ERROR: no such key"));
        assert!(!err.is_success());

        assert_eq!(Response::Ack.message(), None);
        assert_eq!(
            Response::from(KvError::KeyTooLong).message(),
            Some("ERROR: key too long")
        );
    }

    #[test]
    fn test_request_key_accessor() {
        assert_eq!(Request::get("a").key(), Some("a"));
        assert_eq!(Request::put("b", "v").key(), Some("b"));
        assert_eq!(Request::del("c").key(), Some("c"));
        assert_eq!(Request::Commit.key(), None);
        assert_eq!(Request::Info.name(), "INFO");
    }
}
