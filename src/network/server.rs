//! Socket Server Implementation
//!
//! Accepts TCP connections and hands them to a fixed pool of workers through a
//! [`WorkQueue`]. Each worker serves one request/response exchange at a time.

use crate::error::{KvError, Result};
use crate::protocol::{Request, Response, read_frame, write_frame};
use crate::queue::WorkQueue;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// How long a worker waits for a client to send its request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Request processing logic plugged into a [`SocketServer`].
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, req: Request) -> Response;
}

pub struct SocketServer<H: Handler> {
    handler: Arc<H>,
    max_threads: usize,
}

impl<H: Handler> SocketServer<H> {
    pub fn new(handler: Arc<H>, max_threads: usize) -> Self {
        Self {
            handler,
            max_threads: max_threads.max(1),
        }
    }

    /// Binds `host:port`, spawns the accept loop and the workers, and returns
    /// immediately. Port 0 picks a free port; see [`ServerHandle::local_addr`].
    pub async fn start(self, host: &str, port: u16) -> Result<ServerHandle> {
        let listener = TcpListener::bind((host, port)).await?;
        let local_addr = listener.local_addr()?;
        let queue: Arc<WorkQueue<TcpStream>> = Arc::new(WorkQueue::new());

        let mut tasks = Vec::with_capacity(self.max_threads + 1);
        for worker_id in 0..self.max_threads {
            let queue = queue.clone();
            let handler = self.handler.clone();
            tasks.push(tokio::spawn(async move {
                worker_loop(worker_id, queue, handler).await;
            }));
        }

        let accept_queue = queue.clone();
        tasks.push(tokio::spawn(async move {
            accept_loop(listener, accept_queue).await;
        }));

        tracing::info!(
            "Socket server listening on {} with {} workers",
            local_addr,
            self.max_threads
        );

        Ok(ServerHandle {
            local_addr,
            queue,
            tasks,
        })
    }
}

/// Running server. Dropping the handle stops it.
pub struct ServerHandle {
    local_addr: SocketAddr,
    queue: Arc<WorkQueue<TcpStream>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Stops accepting, aborts the workers and drops pending connections.
    pub async fn stop(mut self) {
        self.shutdown();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        tracing::info!("Socket server on {} stopped", self.local_addr);
    }

    fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        self.queue.drain();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(listener: TcpListener, queue: Arc<WorkQueue<TcpStream>>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::trace!("Accepted connection from {}", peer);
                queue.push(stream);
            }
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

async fn worker_loop<H: Handler>(worker_id: usize, queue: Arc<WorkQueue<TcpStream>>, handler: Arc<H>) {
    tracing::debug!("Worker {} started", worker_id);

    loop {
        let stream = queue.pop().await;
        if let Err(e) = serve_connection(stream, handler.as_ref()).await {
            tracing::debug!("Worker {} dropped connection: {}", worker_id, e);
        }
    }
}

async fn serve_connection<H: Handler>(mut stream: TcpStream, handler: &H) -> Result<()> {
    let request = match tokio::time::timeout(REQUEST_TIMEOUT, read_frame::<_, Request>(&mut stream)).await {
        Ok(request) => request,
        Err(_) => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "client sent no request",
            )
            .into());
        }
    };

    let response = match request {
        Ok(req) => {
            tracing::debug!("Handling {} request", req.name());
            handler.handle(req).await
        }
        // A well-framed but undecodable request still gets an answer
        Err(KvError::Codec(e)) => {
            tracing::warn!("Malformed request: {}", e);
            Response::error(&KvError::InvalidRequest)
        }
        Err(e) => return Err(e),
    };

    write_frame(&mut stream, &response).await
}
