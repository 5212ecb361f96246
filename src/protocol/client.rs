use super::codec::{read_frame, write_frame};
use super::message::{Request, Response};
use crate::error::{KvError, Result};

use std::time::Duration;
use tokio::net::TcpStream;

pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a connection to `host:port`.
///
/// This is the only place a [`KvError::ConnectionFailure`] originates; callers
/// use it to tell an unreachable peer apart from one that failed to answer.
pub async fn connect_to(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = format!("{}:{}", host, port);
    match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => {
            let _ = stream.set_nodelay(true);
            Ok(stream)
        }
        Ok(Err(e)) => Err(KvError::ConnectionFailure(format!("{}: {}", addr, e))),
        Err(_) => Err(KvError::ConnectionFailure(format!("{}: connect timed out", addr))),
    }
}

/// Sends one request over an open connection and waits for its response.
pub async fn exchange(stream: &mut TcpStream, req: &Request, timeout: Duration) -> Result<Response> {
    let round_trip = async {
        write_frame(&mut *stream, req).await?;
        read_frame::<_, Response>(&mut *stream).await
    };

    match tokio::time::timeout(timeout, round_trip).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            format!("no response to {} within {:?}", req.name(), timeout),
        )
        .into()),
    }
}

/// Connects, sends `req` and returns the response using the default timeouts.
pub async fn send_request(host: &str, port: u16, req: &Request) -> Result<Response> {
    let mut stream = connect_to(host, port, CONNECT_TIMEOUT).await?;
    exchange(&mut stream, req, RESPONSE_TIMEOUT).await
}
