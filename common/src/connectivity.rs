use std::time::Duration;

use log::{info, warn};

/// The connectivity manager's view of whether a network link is usable.
/// Transitions are owned exclusively by [`ConnectivityManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// A station-mode network link.
///
/// Implemented by the platform glue (wifi on the device, loopback on a host).
pub trait NetworkLink {
    /// Starts one association attempt with the configured credentials.
    /// Failures are not reported here; [`NetworkLink::is_up`] is the only
    /// source of truth.
    fn join(&mut self);

    /// Whether the link is currently usable.
    fn is_up(&self) -> bool;
}

/// How often and how long `ensure_connected` keeps retrying.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Delay between association attempts.
    pub poll_interval: Duration,

    /// Maximum number of attempts, or `None` to retry forever.
    ///
    /// `None` reproduces the original firmware, which blocks the whole loop
    /// until the link comes up. Bound this on deployments where a frozen
    /// display during reconnects is unacceptable.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

/// Owns the link state and brings the link up before any upload attempt.
pub struct ConnectivityManager<L> {
    link: L,
    policy: RetryPolicy,
    state: ConnectionState,
}

impl<L: NetworkLink> ConnectivityManager<L> {
    pub fn new(link: L, policy: RetryPolicy) -> Self {
        Self {
            link,
            policy,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns `Connected` as soon as the link is up. An already-up link is a
    /// status check and nothing else.
    ///
    /// A down link puts the manager into `Connecting` and runs a blocking
    /// retry loop: attempt association, wait one poll interval, recheck.
    /// With an unbounded [`RetryPolicy`] this call does not return until the
    /// link comes up, freezing the caller's loop; with a bounded one it gives
    /// up after `max_attempts` and reports `Disconnected`.
    pub fn ensure_connected(&mut self) -> ConnectionState {
        if self.link.is_up() {
            self.state = ConnectionState::Connected;
            return self.state;
        }

        self.state = ConnectionState::Connecting;
        info!("link down, connecting");

        let mut attempts: u32 = 0;
        loop {
            self.link.join();
            attempts += 1;

            if !self.policy.poll_interval.is_zero() {
                std::thread::sleep(self.policy.poll_interval);
            }

            if self.link.is_up() {
                info!("link up after {attempts} attempt(s)");
                self.state = ConnectionState::Connected;
                return self.state;
            }

            if let Some(max) = self.policy.max_attempts {
                if attempts >= max {
                    warn!("link still down after {attempts} attempts, giving up");
                    self.state = ConnectionState::Disconnected;
                    return self.state;
                }
            }

            info!("still connecting (attempt {attempts})");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FlakyLink {
        joins: Rc<Cell<u32>>,
        up_after: u32,
    }

    impl NetworkLink for FlakyLink {
        fn join(&mut self) {
            self.joins.set(self.joins.get() + 1);
        }

        fn is_up(&self) -> bool {
            self.joins.get() >= self.up_after
        }
    }

    fn instant_retry(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            poll_interval: Duration::ZERO,
            max_attempts,
        }
    }

    #[test]
    fn already_up_link_is_a_noop() {
        let joins = Rc::new(Cell::new(0));
        let link = FlakyLink {
            joins: joins.clone(),
            up_after: 0,
        };
        let mut manager = ConnectivityManager::new(link, instant_retry(None));

        assert_eq!(manager.ensure_connected(), ConnectionState::Connected);
        assert_eq!(joins.get(), 0, "no association attempt for an up link");
    }

    #[test]
    fn retries_until_the_link_comes_up() {
        let joins = Rc::new(Cell::new(0));
        let link = FlakyLink {
            joins: joins.clone(),
            up_after: 3,
        };
        let mut manager = ConnectivityManager::new(link, instant_retry(None));

        assert_eq!(manager.ensure_connected(), ConnectionState::Connected);
        assert_eq!(joins.get(), 3);
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[test]
    fn bounded_policy_gives_up_as_disconnected() {
        let joins = Rc::new(Cell::new(0));
        let link = FlakyLink {
            joins: joins.clone(),
            up_after: u32::MAX,
        };
        let mut manager = ConnectivityManager::new(link, instant_retry(Some(5)));

        assert_eq!(manager.ensure_connected(), ConnectionState::Disconnected);
        assert_eq!(joins.get(), 5);
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }
}
