use std::{
    net::IpAddr,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use mdns_sd::{ServiceDaemon, ServiceEvent};

use crate::remote::session::service_name;

const DACP_SERVICE_TYPE: &str = "_dacp._tcp.local.";
const POLL: Duration = Duration::from_millis(250);

/// Finds the address of a sender's DACP server.
pub trait RemoteLocator: Send + Sync {
    /// Blocks for at most the locator's window. `None` when nothing matched.
    fn locate(&self, dacp_id: &str) -> Option<IpAddr>;
}

/// Browses `_dacp._tcp` advertisements over multicast DNS.
pub struct MdnsLocator {
    window: Duration,
}

impl MdnsLocator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }
}

impl RemoteLocator for MdnsLocator {
    fn locate(&self, dacp_id: &str) -> Option<IpAddr> {
        let mdns = match ServiceDaemon::new() {
            Ok(mdns) => mdns,
            Err(err) => {
                warn!("Failed to start mDNS daemon: {err}");
                return None;
            }
        };
        let browse_receiver = match mdns.browse(DACP_SERVICE_TYPE) {
            Ok(receiver) => receiver,
            Err(err) => {
                warn!("Failed to browse {DACP_SERVICE_TYPE}: {err}");
                let _ = mdns.shutdown();
                return None;
            }
        };

        let wanted = service_name(dacp_id);
        let deadline = Instant::now() + self.window;
        let mut found = None;
        while found.is_none() && Instant::now() < deadline {
            let timeout = deadline
                .saturating_duration_since(Instant::now())
                .min(POLL);
            let Ok(event) = browse_receiver.recv_timeout(timeout) else {
                continue;
            };
            if let ServiceEvent::ServiceResolved(service) = event {
                let instance = service.get_fullname();
                if !instance.contains(dacp_id) {
                    debug!("Ignoring mDNS instance {instance}, waiting for {wanted}");
                    continue;
                }
                info!("mDNS instance {instance} on port {}", service.get_port());
                let mut v4_addresses: Vec<_> = service.get_addresses_v4().iter().copied().collect();
                v4_addresses.sort();
                found = v4_addresses.first().map(|ip| IpAddr::from(ip.octets()));
            }
        }

        if let Err(err) = mdns.stop_browse(DACP_SERVICE_TYPE) {
            debug!("Failed to stop mDNS browse cleanly: {err}");
        }
        let _ = mdns.shutdown();

        match found {
            Some(host) => info!("Found remote control service {wanted} at {host}"),
            None => warn!("No remote control service {wanted} within {:?}", self.window),
        }
        found
    }
}
