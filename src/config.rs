//! Node Configuration
//!
//! Plain settings structs for the two node roles. Both start from sensible
//! defaults and are adjusted with `with_*` setters.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Number of replicas that must register before requests are served.
    pub slave_capacity: usize,
    /// Replicas holding each key (primary plus successors).
    pub redundancy: usize,
    pub num_sets: usize,
    pub elem_per_set: usize,
    pub max_threads: usize,
    pub connect_timeout: Duration,
    pub response_timeout: Duration,
    /// Connect timeout used when probing replicas for INFO.
    pub info_probe_timeout: Duration,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            slave_capacity: 2,
            redundancy: 2,
            num_sets: 4,
            elem_per_set: 4,
            max_threads: 8,
            connect_timeout: Duration::from_millis(500),
            response_timeout: Duration::from_secs(5),
            info_probe_timeout: Duration::from_millis(200),
            retry_base_delay: Duration::from_millis(150),
            retry_max_delay: Duration::from_millis(1200),
        }
    }
}

impl CoordinatorConfig {
    pub fn new(slave_capacity: usize, redundancy: usize) -> Self {
        Self::default()
            .with_slave_capacity(slave_capacity)
            .with_redundancy(redundancy)
    }

    pub fn with_slave_capacity(mut self, slave_capacity: usize) -> Self {
        self.slave_capacity = slave_capacity;
        self.redundancy = self.redundancy.min(slave_capacity);
        self
    }

    /// Clamped to `slave_capacity`.
    pub fn with_redundancy(mut self, redundancy: usize) -> Self {
        self.redundancy = redundancy.min(self.slave_capacity);
        self
    }

    pub fn with_cache(mut self, num_sets: usize, elem_per_set: usize) -> Self {
        self.num_sets = num_sets;
        self.elem_per_set = elem_per_set;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.retry_base_delay = base;
        self.retry_max_delay = max.max(base);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    /// Store directory. The transaction log lives in `<dirname>/tpclog`.
    pub dirname: PathBuf,
    pub num_sets: usize,
    pub elem_per_set: usize,
    pub hostname: String,
    pub port: u16,
    /// Participate in two-phase commit instead of applying writes directly.
    pub use_tpc: bool,
    pub max_threads: usize,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            dirname: PathBuf::from("kvstore-data"),
            num_sets: 4,
            elem_per_set: 4,
            hostname: "localhost".to_string(),
            port: 0,
            use_tpc: true,
            max_threads: 4,
        }
    }
}

impl ReplicaConfig {
    pub fn new(dirname: impl Into<PathBuf>) -> Self {
        Self {
            dirname: dirname.into(),
            ..Self::default()
        }
    }

    pub fn with_cache(mut self, num_sets: usize, elem_per_set: usize) -> Self {
        self.num_sets = num_sets;
        self.elem_per_set = elem_per_set;
        self
    }

    pub fn with_address(mut self, hostname: impl Into<String>, port: u16) -> Self {
        self.hostname = hostname.into();
        self.port = port;
        self
    }

    pub fn with_tpc(mut self, use_tpc: bool) -> Self {
        self.use_tpc = use_tpc;
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dirname.join("tpclog")
    }
}
