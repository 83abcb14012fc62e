// Allow dead code: the subscription surface is for long-running consumers;
// one-shot commands probe once and read the flag.
#![allow(dead_code)]

//! Connectivity oracle: current network reachability plus change
//! notifications.
//!
//! The dispatcher reads the flag synchronously at the moment of dispatch;
//! reachability can flip between the time a screen renders and the time
//! the panic action fires, so callers must not cache an earlier read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info};

/// Probe request timeout in seconds.
/// Short, so a black-holed network reads as unreachable instead of
/// stalling the panic flow until the transport gives up.
const PROBE_TIMEOUT_SECS: u64 = 5;

/// HTTP client for reachability probes, with the short probe timeout
pub fn probe_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
        .build()
}

/// Read side of the connectivity state, consumed by the dispatcher.
pub trait ConnectivityOracle {
    /// Current reachability at the instant of the call
    fn is_reachable(&self) -> bool;
}

type Listener = Box<dyn Fn(bool) + Send + Sync>;

/// Tracks backend reachability and notifies subscribers on change.
/// Clone is cheap - state is shared behind `Arc`.
#[derive(Clone)]
pub struct ConnectivityMonitor {
    reachable: Arc<AtomicBool>,
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(initially_reachable)),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a callback invoked whenever reachability changes.
    /// The callback runs on the thread that observed the change.
    pub fn subscribe(&self, listener: impl Fn(bool) + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// Update the flag; subscribers are only notified on an actual change.
    pub fn set_reachable(&self, reachable: bool) {
        let previous = self.reachable.swap(reachable, Ordering::SeqCst);
        if previous != reachable {
            info!(reachable, "Connectivity changed");
            if let Ok(listeners) = self.listeners.lock() {
                for listener in listeners.iter() {
                    listener(reachable);
                }
            }
        }
    }

    /// Probe the backend once and record the result.
    /// Any HTTP response counts as reachable; only a transport failure
    /// (DNS, connect, timeout) marks the network as down.
    pub async fn probe_once(&self, client: &reqwest::Client, base_url: &str) -> bool {
        let reachable = match client.head(base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Connectivity probe failed");
                false
            }
        };
        self.set_reachable(reachable);
        reachable
    }
}

impl ConnectivityOracle for ConnectivityMonitor {
    fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}
