//! Two-Phase Commit Coordinator
//!
//! Routes client requests to the replicas that own each key and drives
//! two-phase commit for writes.
//!
//! ## Responsibilities
//! - **Reads**: serve from the coordinator cache, else ask the key's replicas in ring order.
//! - **Writes**: collect votes from every replica in the key's set, then deliver the
//!   decision to each of them, retrying until every one acknowledges.
//! - **Membership**: accept registrations and report reachable replicas.

use super::observer::{NoopObserver, TpcObserver};
use super::ring::{ReplicaInfo, Ring};
use crate::cache::Cache;
use crate::config::CoordinatorConfig;
use crate::error::{KvError, Result};
use crate::network::Handler;
use crate::protocol::{Request, Response, connect_to, exchange, info_header};
use crate::storage::KvStore;

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

pub struct Coordinator {
    config: CoordinatorConfig,
    ring: Ring,
    cache: Cache,
    in_flight: AtomicBool,
    /// Bumped each time a write commits. Reads only fill the cache if it has
    /// not moved while they waited on a replica.
    write_epoch: AtomicU64,
    observer: Arc<dyn TpcObserver>,
}

impl Coordinator {
    pub fn new(config: CoordinatorConfig) -> Result<Self> {
        let cache = Cache::new(config.num_sets, config.elem_per_set)?;
        let ring = Ring::new(config.slave_capacity);

        Ok(Self {
            config,
            ring,
            cache,
            in_flight: AtomicBool::new(false),
            write_epoch: AtomicU64::new(0),
            observer: Arc::new(NoopObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn TpcObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn ring(&self) -> &Ring {
        &self.ring
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn register(&self, host: &str, port: u16) -> Response {
        self.ring.register(host, port).map(|_| ()).into()
    }

    pub async fn handle_get(&self, key: &str) -> Response {
        if let Err(e) = KvStore::check_key(key) {
            return Response::error(&e);
        }

        if let Some(value) = self.cache.get(key) {
            return Response::GetResp {
                key: key.to_string(),
                value,
            };
        }

        if !self.ring.is_full() {
            return Response::error(&KvError::Generic);
        }

        let epoch = self.write_epoch.load(Ordering::Acquire);
        let req = Request::get(key);
        for replica in self.ring.replica_set(key, self.config.redundancy) {
            match self.contact(&replica, &req).await {
                Ok(Response::GetResp { key, value }) => {
                    self.fill_cache(&key, &value, epoch);
                    return Response::GetResp { key, value };
                }
                Ok(other) => {
                    tracing::debug!("Replica {} answered GET with {:?}", replica.id, other);
                }
                Err(e) => {
                    tracing::debug!("GET from replica {}:{} failed: {}", replica.host, replica.port, e);
                }
            }
        }

        Response::error(&KvError::NoSuchKey)
    }

    /// Runs a PUT or DEL through two-phase commit.
    pub async fn handle_tpc(&self, req: Request) -> Response {
        let check = match &req {
            Request::Put { key, value } => KvStore::check_put(key, value),
            Request::Del { key } => KvStore::check_key(key),
            _ => Err(KvError::InvalidRequest),
        };
        if let Err(e) = check {
            return Response::error(&e);
        }

        if !self.ring.is_full() {
            return Response::error(&KvError::Generic);
        }

        let Some(_gate) = TransactionGate::acquire(&self.in_flight) else {
            return Response::error(&KvError::InvalidRequest);
        };

        let key = req.key().unwrap_or_default();
        let cohort = self.ring.replica_set(key, self.config.redundancy);
        let tx = Uuid::new_v4();
        tracing::info!(
            "[tx {}] {} started across {} replicas",
            tx,
            req.name(),
            cohort.len()
        );

        let mut commit = true;
        for replica in &cohort {
            match self.contact(replica, &req).await {
                Ok(Response::VoteCommit) => {}
                Ok(other) => {
                    tracing::info!("[tx {}] replica {} voted against: {:?}", tx, replica.id, other);
                    commit = false;
                }
                Err(KvError::ConnectionFailure(e)) => {
                    tracing::warn!("[tx {}] replica {} unreachable during vote: {}", tx, replica.id, e);
                    self.observer.on_unreachable(replica);
                    commit = false;
                }
                Err(e) => {
                    tracing::warn!("[tx {}] no vote from replica {}: {}", tx, replica.id, e);
                    commit = false;
                }
            }
        }

        self.observer.on_phase_transition();

        let decision = if commit { Request::Commit } else { Request::Abort };
        tracing::info!("[tx {}] decided {}", tx, decision.name());
        for replica in &cohort {
            self.deliver(tx, replica, &decision).await;
        }

        if !commit {
            return Response::error(&KvError::Generic);
        }

        self.commit_to_cache(&req);
        Response::success()
    }

    /// Lists every registered replica that accepts a connection right now.
    pub async fn info(&self) -> Response {
        let mut message = format!("{}\nSlaves:", info_header());
        for replica in self.ring.replicas() {
            if connect_to(&replica.host, replica.port, self.config.info_probe_timeout)
                .await
                .is_ok()
            {
                message.push_str(&format!("\n{{{}, {}}}", replica.host, replica.port));
            }
        }
        Response::Resp { message }
    }

    /// Caches a value read from a replica unless a write committed after `epoch`.
    fn fill_cache(&self, key: &str, value: &str, epoch: u64) {
        let mut set = self.cache.getlock(key).write();
        if self.write_epoch.load(Ordering::Acquire) == epoch {
            set.put(key, value);
        } else {
            tracing::debug!("Not caching {}: a write committed during the read", key);
        }
    }

    /// Writes a committed PUT through to the cache, or drops a deleted key.
    fn commit_to_cache(&self, req: &Request) {
        let Some(key) = req.key() else {
            return;
        };
        let mut set = self.cache.getlock(key).write();
        self.write_epoch.fetch_add(1, Ordering::AcqRel);
        match req {
            Request::Put { key, value } => set.put(key, value),
            Request::Del { key } => {
                let _ = set.delete(key);
            }
            _ => {}
        }
    }

    async fn contact(&self, replica: &ReplicaInfo, req: &Request) -> Result<Response> {
        let mut stream = connect_to(&replica.host, replica.port, self.config.connect_timeout).await?;
        exchange(&mut stream, req, self.config.response_timeout).await
    }

    /// Sends the decision to `replica` until it acknowledges.
    async fn deliver(&self, tx: Uuid, replica: &ReplicaInfo, decision: &Request) {
        let mut delay_ms = self.config.retry_base_delay.as_millis() as u64;
        let max_delay_ms = self.config.retry_max_delay.as_millis() as u64;

        loop {
            match self.contact(replica, decision).await {
                Ok(Response::Ack) => return,
                Ok(other) => {
                    tracing::warn!("[tx {}] replica {} did not ack: {:?}", tx, replica.id, other);
                }
                Err(KvError::ConnectionFailure(e)) => {
                    tracing::warn!("[tx {}] replica {} unreachable, retrying: {}", tx, replica.id, e);
                    self.observer.on_unreachable(replica);
                }
                Err(e) => {
                    tracing::warn!("[tx {}] replica {} failed to ack, retrying: {}", tx, replica.id, e);
                }
            }

            let jitter = rand::random::<u64>() % 50;
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
            delay_ms = (delay_ms * 2).min(max_delay_ms);
        }
    }
}

#[async_trait]
impl Handler for Coordinator {
    async fn handle(&self, req: Request) -> Response {
        match req {
            Request::Info => self.info().await,
            Request::Register { host, port } => self.register(&host, port),
            Request::Get { key } => self.handle_get(&key).await,
            Request::Put { .. } | Request::Del { .. } => self.handle_tpc(req).await,
            Request::Commit | Request::Abort => Response::error(&KvError::InvalidRequest),
        }
    }
}

/// Holds the coordinator's single-transaction flag until dropped.
struct TransactionGate<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TransactionGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TransactionGate<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
