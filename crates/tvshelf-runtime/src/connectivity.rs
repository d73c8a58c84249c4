use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tvshelf_core::config::ConnectivityConfig;

use crate::RuntimeError;

/// Reports whether the remote catalog is currently reachable.
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;

    /// `Err(NotOnline)` when unreachable, for callers that branch on errors.
    fn check(&self) -> Result<(), RuntimeError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(RuntimeError::NotOnline)
        }
    }
}

/// Probes reachability by opening (and immediately dropping) a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConnectivityConfig) -> Self {
        Self::new(config.probe_addr.clone(), config.timeout())
    }
}

impl ConnectivityProbe for TcpProbe {
    fn is_online(&self) -> bool {
        let addrs = match self.addr.to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!(addr = %self.addr, "probe address did not resolve: {e}");
                return false;
            }
        };
        addrs
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, self.timeout).is_ok())
    }
}

/// A probe whose answer is set by hand.
#[derive(Debug)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityProbe for StaticProbe {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn test_tcp_probe_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpProbe::new(addr.to_string(), Duration::from_millis(500));
        assert!(probe.is_online());
        assert!(probe.check().is_ok());
    }

    #[test]
    fn test_tcp_probe_offline_when_nothing_listens() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let probe = TcpProbe::new(addr.to_string(), Duration::from_millis(500));
        assert!(!probe.is_online());
    }

    #[test]
    fn test_unresolvable_address_is_offline() {
        let probe = TcpProbe::new("not a host", Duration::from_millis(100));
        assert!(!probe.is_online());
    }

    #[test]
    fn test_static_probe() {
        let probe = StaticProbe::new(true);
        assert!(probe.is_online());
        probe.set_online(false);
        assert!(matches!(probe.check(), Err(RuntimeError::NotOnline)));
    }
}
