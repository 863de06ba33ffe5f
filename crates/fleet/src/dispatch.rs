//! Concurrent fan-out of one remote operation across a host set
//!
//! Each host gets its own worker. Workers write into their own slot of a
//! result table indexed by host position, so no shared map or lock is needed;
//! the table is turned into a host-keyed [`ResultSet`] once every worker has
//! reached a terminal state. A failing host never cancels the others.

use crate::error::{Error, Result};
use crate::host::Host;
use crate::results::{NodeResult, ResultSet};
use rayon::prelude::*;
use std::collections::HashSet;

/// A blocking query or command run against one host
///
/// The dispatcher never looks inside the operation. Any deadline belongs to
/// the implementation, which should return an error rather than block forever.
pub trait RemoteOperation: Sync {
    /// Value produced on success
    type Output: Send;

    /// Run the operation against a single host
    fn run(&self, host: &Host) -> NodeResult<Self::Output>;
}

impl<F, T> RemoteOperation for F
where
    F: Fn(&Host) -> NodeResult<T> + Sync,
    T: Send,
{
    type Output = T;

    fn run(&self, host: &Host) -> NodeResult<T> {
        self(host)
    }
}

/// Observer notified as hosts finish
///
/// Called from worker threads, in completion order.
pub trait DispatchProgress: Sync {
    /// Called once per host when its operation finishes
    fn on_host_complete(&self, host: &Host, success: bool);
}

/// No-op progress observer
pub struct NoProgress;

impl DispatchProgress for NoProgress {
    fn on_host_complete(&self, _host: &Host, _success: bool) {}
}

/// Options for a dispatch round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Upper bound on concurrent workers; `None` means one worker per host
    pub max_concurrency: Option<usize>,
}

impl DispatchOptions {
    /// Options with a concurrency cap
    pub fn with_max_concurrency(max: usize) -> Self {
        Self {
            max_concurrency: Some(max),
        }
    }

    /// Number of workers to use for a round of `hosts` hosts
    pub fn worker_count(&self, hosts: usize) -> usize {
        let hosts = hosts.max(1);
        match self.max_concurrency {
            Some(cap) => cap.clamp(1, hosts),
            None => hosts,
        }
    }
}

/// Runs a [`RemoteOperation`] on every host of a round and waits for all of them
///
/// The dispatcher holds no state across rounds.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: DispatchOptions,
}

impl Dispatcher {
    /// Dispatcher with one worker per host
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with explicit options
    pub fn with_options(options: DispatchOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Run `op` once per host and return one outcome per host
    ///
    /// Only fails when the round cannot start: duplicate host ids or a worker
    /// pool that cannot be created. Per-host failures live in the result set.
    pub fn dispatch<O>(&self, hosts: &[Host], op: &O) -> Result<ResultSet<O::Output>>
    where
        O: RemoteOperation + ?Sized,
    {
        self.dispatch_with_progress(hosts, op, &NoProgress)
    }

    /// Like [`dispatch`](Self::dispatch), reporting each host as it completes
    pub fn dispatch_with_progress<O, P>(
        &self,
        hosts: &[Host],
        op: &O,
        progress: &P,
    ) -> Result<ResultSet<O::Output>>
    where
        O: RemoteOperation + ?Sized,
        P: DispatchProgress + ?Sized,
    {
        ensure_unique(hosts)?;

        if hosts.is_empty() {
            return Ok(ResultSet::from_results(Vec::new()));
        }

        let workers = self.options.worker_count(hosts.len());
        log::debug!(
            "Dispatching to {} host(s) with {} worker(s)",
            hosts.len(),
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("dispatch-{i}"))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;

        // Slot i belongs to hosts[i]; collect preserves positions.
        let slots: Vec<NodeResult<O::Output>> = pool.install(|| {
            hosts
                .par_iter()
                .with_max_len(1)
                .map(|host| {
                    let result = op.run(host);
                    if let Err(e) = &result {
                        log::debug!("{}: {}", host.id, e);
                    }
                    progress.on_host_complete(host, result.is_ok());
                    result
                })
                .collect()
        });

        debug_assert_eq!(slots.len(), hosts.len());

        let set = ResultSet::from_results(hosts.iter().map(|h| h.id.clone()).zip(slots));
        log::debug!(
            "Dispatch round finished: {} ok, {} failed",
            set.len() - set.error_host_map().len(),
            set.error_host_map().len()
        );
        Ok(set)
    }
}

/// Dispatch with default options (one worker per host)
pub fn dispatch<O>(hosts: &[Host], op: &O) -> Result<ResultSet<O::Output>>
where
    O: RemoteOperation + ?Sized,
{
    Dispatcher::new().dispatch(hosts, op)
}

fn ensure_unique(hosts: &[Host]) -> Result<()> {
    let mut seen = HashSet::with_capacity(hosts.len());
    for host in hosts {
        if !seen.insert(host.id.as_str()) {
            return Err(Error::DuplicateHost(host.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn hosts(n: usize) -> Vec<Host> {
        (0..n)
            .map(|i| Host::new(format!("node-{i}"), format!("10.0.0.{i}")))
            .collect()
    }

    /// Tracks how many operations run at the same time
    #[derive(Default)]
    struct ConcurrencyProbe {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ConcurrencyProbe {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_one_entry_per_host() {
        let hosts = hosts(7);
        let set = dispatch(&hosts, &|h: &Host| -> NodeResult<String> {
            Ok(h.address.clone())
        })
        .unwrap();

        assert_eq!(set.len(), 7);
        assert!(!set.has_errors());
        for host in &hosts {
            assert_eq!(set.value(&host.id), Some(&host.address));
        }
    }

    #[test]
    fn test_single_failing_host_is_isolated() {
        let hosts = hosts(5);
        let op = |h: &Host| {
            if h.id == "node-3" {
                Err(Error::transport("connection refused"))
            } else {
                Ok(())
            }
        };

        let set = dispatch(&hosts, &op).unwrap();

        assert!(set.has_errors());
        let errors = set.error_host_map();
        assert_eq!(errors.hosts(), vec!["node-3"]);
        assert_eq!(set.value_map().len(), 4);
        assert_eq!(errors.len() + set.value_map().len(), set.len());
    }

    #[test]
    fn test_each_host_runs_exactly_once() {
        let hosts = hosts(12);
        let calls = Mutex::new(Vec::new());
        let op = |h: &Host| -> NodeResult<()> {
            calls.lock().unwrap().push(h.id.clone());
            Ok(())
        };

        dispatch(&hosts, &op).unwrap();

        let mut calls = calls.into_inner().unwrap();
        calls.sort();
        let mut expected: Vec<String> = hosts.iter().map(|h| h.id.clone()).collect();
        expected.sort();
        assert_eq!(calls, expected);
    }

    #[test]
    fn test_order_independent() {
        let forward = hosts(6);
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(2);

        let op = |h: &Host| {
            if h.id.ends_with('1') {
                Err(Error::parse("missing result"))
            } else {
                Ok(h.id.len())
            }
        };

        let a = dispatch(&forward, &op).unwrap();
        let b = dispatch(&reversed, &op).unwrap();
        let c = dispatch(&rotated, &op).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_duplicate_host_rejected() {
        let mut hosts = hosts(3);
        hosts.push(Host::new("node-1", "10.0.0.99"));

        let err = dispatch(&hosts, &|_: &Host| -> NodeResult<()> { Ok(()) }).unwrap_err();
        assert_eq!(err, Error::DuplicateHost("node-1".into()));
    }

    #[test]
    fn test_empty_round() {
        let set = dispatch(&[], &|_: &Host| -> NodeResult<()> { Ok(()) }).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_concurrency_cap_is_respected() {
        let hosts = hosts(6);
        let probe = ConcurrencyProbe::default();
        let op = |_: &Host| -> NodeResult<()> {
            probe.enter();
            thread::sleep(Duration::from_millis(20));
            probe.exit();
            Ok(())
        };

        let dispatcher = Dispatcher::with_options(DispatchOptions::with_max_concurrency(1));
        let set = dispatcher.dispatch(&hosts, &op).unwrap();

        assert_eq!(set.len(), 6);
        assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unbounded_round_runs_hosts_in_parallel() {
        let hosts = hosts(8);
        let probe = ConcurrencyProbe::default();
        let op = |_: &Host| -> NodeResult<()> {
            probe.enter();
            thread::sleep(Duration::from_millis(100));
            probe.exit();
            Ok(())
        };

        dispatch(&hosts, &op).unwrap();

        assert!(probe.peak.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn test_progress_sees_every_host() {
        struct Counting {
            ok: AtomicUsize,
            failed: AtomicUsize,
        }

        impl DispatchProgress for Counting {
            fn on_host_complete(&self, _host: &Host, success: bool) {
                if success {
                    self.ok.fetch_add(1, Ordering::SeqCst);
                } else {
                    self.failed.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let hosts = hosts(4);
        let progress = Counting {
            ok: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };
        let op = |h: &Host| {
            if h.id == "node-0" {
                Err(Error::transport("timeout"))
            } else {
                Ok(())
            }
        };

        Dispatcher::new()
            .dispatch_with_progress(&hosts, &op, &progress)
            .unwrap();

        assert_eq!(progress.ok.load(Ordering::SeqCst), 3);
        assert_eq!(progress.failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(DispatchOptions::default().worker_count(5), 5);
        assert_eq!(DispatchOptions::with_max_concurrency(2).worker_count(5), 2);
        assert_eq!(DispatchOptions::with_max_concurrency(10).worker_count(5), 5);
        assert_eq!(DispatchOptions::with_max_concurrency(0).worker_count(5), 1);
        assert_eq!(DispatchOptions::default().worker_count(0), 1);
    }
}
