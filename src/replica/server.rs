//! Replica Server Implementation
//!
//! A replica answers single-key requests from its cache and durable store, and
//! takes part in two-phase commit as a cohort member.
//!
//! ## Responsibilities
//! - **Reads**: cache first, then the store, populating the cache on a miss.
//! - **Voting**: validate and durably log a PUT/DEL before voting to commit.
//! - **Decisions**: log COMMIT/ABORT, apply committed operations, acknowledge.
//! - **Recovery**: replay the transaction log after a restart.

use super::state::{Operation, TpcState};
use crate::cache::Cache;
use crate::config::ReplicaConfig;
use crate::error::{KvError, Result};
use crate::network::Handler;
use crate::protocol::{Request, Response, info_header, send_request};
use crate::storage::KvStore;
use crate::txlog::{EntryKind, TxLog};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU16, Ordering};

struct Transaction {
    state: TpcState,
    log: TxLog,
}

pub struct KvServer {
    config: ReplicaConfig,
    port: AtomicU16,
    store: KvStore,
    cache: Cache,
    txn: Mutex<Transaction>,
}

impl KvServer {
    /// Opens the store and log under `config.dirname` without replaying the log.
    pub fn new(config: ReplicaConfig) -> Result<Self> {
        let store = KvStore::new(&config.dirname)?;
        let log = TxLog::new(config.log_dir())?;
        let cache = Cache::new(config.num_sets, config.elem_per_set)?;

        Ok(Self {
            port: AtomicU16::new(config.port),
            config,
            store,
            cache,
            txn: Mutex::new(Transaction {
                state: TpcState::Ready,
                log,
            }),
        })
    }

    /// Opens the replica and, in TPC mode, replays its transaction log.
    pub fn open(config: ReplicaConfig) -> Result<Self> {
        let server = Self::new(config)?;
        if server.config.use_tpc {
            server.rebuild_state()?;
        }
        Ok(server)
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    pub fn hostname(&self) -> &str {
        &self.config.hostname
    }

    /// Port advertised to the coordinator.
    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    /// Records the port the socket server actually bound.
    pub fn set_port(&self, port: u16) {
        self.port.store(port, Ordering::SeqCst);
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn tpc_state(&self) -> TpcState {
        self.txn.lock().state.clone()
    }

    /// Serves a GET from the cache, falling back to the store.
    ///
    /// A miss holds the set's write lock across the store read and the cache
    /// fill so concurrent misses on the same set do not fetch twice.
    pub fn handle_get(&self, key: &str) -> Response {
        if let Err(e) = KvStore::check_key(key) {
            return Response::error(&e);
        }

        let lock = self.cache.getlock(key);
        let cached = lock.read().get(key);
        if let Some(value) = cached {
            return get_response(key, value);
        }

        let mut set = lock.write();
        if let Some(value) = set.get(key) {
            return get_response(key, value);
        }

        match self.store.get(key) {
            Ok(value) => {
                set.put(key, &value);
                get_response(key, value)
            }
            Err(e) => Response::error(&e),
        }
    }

    /// Standalone mode: writes are applied immediately.
    pub fn handle_no_tpc(&self, req: Request) -> Response {
        match req {
            Request::Get { key } => self.handle_get(&key),
            Request::Put { key, value } => self.apply(&Operation::Put { key, value }).into(),
            Request::Del { key } => self.apply(&Operation::Del { key }).into(),
            Request::Info => self.info(),
            _ => Response::error(&KvError::InvalidRequest),
        }
    }

    /// Cohort mode: PUT/DEL are votes, COMMIT/ABORT are decisions.
    pub fn handle_tpc(&self, req: Request) -> Response {
        match req {
            Request::Get { key } => self.handle_get(&key),
            Request::Put { key, value } => self.vote(Operation::Put { key, value }),
            Request::Del { key } => self.vote(Operation::Del { key }),
            Request::Commit => self.decide(EntryKind::Commit),
            Request::Abort => self.decide(EntryKind::Abort),
            Request::Info => self.info(),
            Request::Register { .. } => Response::error(&KvError::InvalidRequest),
        }
    }

    pub fn info(&self) -> Response {
        Response::Resp {
            message: format!("{}\n{{{}, {}}}", info_header(), self.hostname(), self.port()),
        }
    }

    /// Replays the transaction log to recover the state left by a crash.
    ///
    /// A trailing PUT/DEL leaves the replica in `Init` so the coordinator can
    /// still deliver its decision. A COMMIT applies the pending operation;
    /// a COMMIT with nothing pending is ignored.
    pub fn rebuild_state(&self) -> Result<()> {
        let mut txn = self.txn.lock();
        let mut state = TpcState::Ready;
        let mut replayed = 0;

        txn.log.iterate_begin();
        while let Some(entry) = txn.log.iterate_next()? {
            replayed += 1;
            state = match (entry.kind, state) {
                (EntryKind::Put | EntryKind::Del, prev) => match Operation::from_entry(&entry) {
                    Some(op) => TpcState::Init(op),
                    None => {
                        tracing::warn!("Skipping malformed {:?} log entry", entry.kind);
                        prev
                    }
                },
                (EntryKind::Commit, TpcState::Init(op)) => {
                    self.apply_committed(&op)?;
                    TpcState::Commit
                }
                (EntryKind::Abort, TpcState::Init(_)) => TpcState::Abort,
                (_, prev) => prev,
            };
        }

        tracing::info!(
            "Replayed {} log entries, resuming in {:?}",
            replayed,
            state
        );
        txn.state = state;
        Ok(())
    }

    /// Announces this replica to the coordinator at `master_host:master_port`.
    pub async fn register_master(&self, master_host: &str, master_port: u16) -> Result<()> {
        let req = Request::Register {
            host: self.hostname().to_string(),
            port: self.port(),
        };

        let resp = send_request(master_host, master_port, &req).await?;
        if resp.is_success() {
            tracing::info!(
                "Registered {}:{} with coordinator {}:{}",
                self.hostname(),
                self.port(),
                master_host,
                master_port
            );
            Ok(())
        } else {
            tracing::warn!("Coordinator refused registration: {:?}", resp.message());
            Err(KvError::Generic)
        }
    }

    /// Deletes the store and the log from disk. The cache is left intact.
    pub fn clean(&self) -> Result<()> {
        let mut txn = self.txn.lock();
        self.store.clean()?;
        txn.state = TpcState::Ready;
        Ok(())
    }

    fn vote(&self, op: Operation) -> Response {
        let mut txn = self.txn.lock();
        if txn.state.is_pending() {
            return Response::error(&KvError::InvalidRequest);
        }

        let check = match &op {
            Operation::Put { key, value } => KvStore::check_put(key, value),
            Operation::Del { key } => KvStore::check_key(key),
        };
        if let Err(e) = check {
            return Response::VoteAbort {
                message: e.to_string(),
            };
        }

        if let Err(e) = record_vote(&mut txn.log, &op) {
            tracing::error!("Failed to log vote: {}", e);
            return Response::VoteAbort {
                message: e.to_string(),
            };
        }

        tracing::debug!("Voted commit on {:?}", op.log_kind());
        txn.state = TpcState::Init(op);
        Response::VoteCommit
    }

    fn decide(&self, decision: EntryKind) -> Response {
        let mut txn = self.txn.lock();
        let op = match &txn.state {
            TpcState::Init(op) => op.clone(),
            _ => {
                tracing::debug!("Acknowledging redelivered {:?}", decision);
                return Response::Ack;
            }
        };

        if let Err(e) = txn.log.log(decision, None, None) {
            tracing::error!("Failed to log {:?}: {}", decision, e);
            return Response::error(&e);
        }

        if decision == EntryKind::Commit {
            // Stay in Init without an ACK so the coordinator redelivers
            if let Err(e) = self.apply_committed(&op) {
                tracing::error!("Failed to apply committed {:?}: {}", op.log_kind(), e);
                return Response::error(&e);
            }
            txn.state = TpcState::Commit;
        } else {
            txn.state = TpcState::Abort;
        }

        Response::Ack
    }

    /// Applies `op` to the store and cache under the key's cache set lock.
    fn apply(&self, op: &Operation) -> Result<()> {
        let mut set = self.cache.getlock(op.key()).write();
        match op {
            Operation::Put { key, value } => {
                self.store.put(key, value)?;
                set.put(key, value);
            }
            Operation::Del { key } => {
                let stored = self.store.del(key);
                // Drop any cached copy even if the store had none
                let _ = set.delete(key);
                stored?;
            }
        }
        Ok(())
    }

    /// Like `apply`, but a DEL of a key that is already gone is not an error.
    fn apply_committed(&self, op: &Operation) -> Result<()> {
        match self.apply(op) {
            Err(KvError::NoSuchKey) => Ok(()),
            other => other,
        }
    }
}

#[async_trait]
impl Handler for KvServer {
    async fn handle(&self, req: Request) -> Response {
        if self.config.use_tpc {
            self.handle_tpc(req)
        } else {
            self.handle_no_tpc(req)
        }
    }
}

/// The log only ever holds the transaction in flight.
fn record_vote(log: &mut TxLog, op: &Operation) -> Result<()> {
    log.clear_log()?;
    log.log(op.log_kind(), Some(op.key()), op.value())
}

fn get_response(key: &str, value: String) -> Response {
    Response::GetResp {
        key: key.to_string(),
        value,
    }
}
