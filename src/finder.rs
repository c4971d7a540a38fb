use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::{debug, trace};

use crate::cipher::GENERAL_KEY;
use crate::device::Device;
use crate::protocol::{self, DISCOVERY_PORT, ScanResponse, VENDOR_BRAND};
use crate::transport::{self, Transport};
use crate::{Error, Result};

/// Broadcasts a scan and collects the units that answer.
#[derive(Debug, Clone)]
pub struct DeviceFinder {
    broadcast: IpAddr,
    port: u16,
}

impl Default for DeviceFinder {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::BROADCAST))
    }
}

impl DeviceFinder {
    pub fn new(broadcast: IpAddr) -> Self {
        Self {
            broadcast,
            port: DISCOVERY_PORT,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn target(&self) -> SocketAddr {
        SocketAddr::new(self.broadcast, self.port)
    }

    /// Send one scan request, then take replies until a receive times out.
    ///
    /// Datagrams that do not decode under the general key, and units of other
    /// brands, are skipped. Only a socket error other than the timeout ends
    /// the scan with an error.
    pub fn scan<T: Transport + ?Sized>(&self, transport: &T) -> Result<DeviceRegistry> {
        let target = self.target();
        trace!(%target, "sending scan request");
        transport.send_to(&protocol::scan_request(), target)?;

        let mut devices = HashMap::new();
        loop {
            let (bytes, from) = match transport::receive(transport) {
                Ok(datagram) => datagram,
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            };

            let pack: ScanResponse = match protocol::decode_response(&bytes, GENERAL_KEY) {
                Ok(pack) => pack,
                Err(Error::MissingPack) => {
                    trace!(%from, "ignoring datagram without pack");
                    continue;
                }
                Err(e) => {
                    debug!(%from, error = %e, "ignoring undecodable scan reply");
                    continue;
                }
            };

            if pack.brand != VENDOR_BRAND {
                debug!(%from, brand = %pack.brand, "ignoring foreign brand");
                continue;
            }
            if pack.mac.is_empty() {
                debug!(%from, "ignoring scan reply without mac");
                continue;
            }

            debug!(%from, mac = %pack.mac, name = %pack.name, "device answered scan");
            let device = Device::from_scan(pack, from);
            devices.insert(device.mac().to_string(), device);
        }

        debug!(count = devices.len(), "scan finished");
        Ok(DeviceRegistry { devices })
    }
}

/// Devices found by one scan, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: HashMap<String, Device>,
}

impl DeviceRegistry {
    pub fn get(&self, mac: &str) -> Option<&Device> {
        self.devices.get(mac)
    }

    /// Match on the textual form of the address, e.g. `"192.168.1.40"`.
    pub fn find_by_address(&self, ip: &str) -> Option<&Device> {
        self.devices.values().find(|d| d.ip().to_string() == ip)
    }

    pub fn take(&mut self, mac: &str) -> Option<Device> {
        self.devices.remove(mac)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> + '_ {
        self.devices.values()
    }

    pub fn into_devices(self) -> Vec<Device> {
        self.devices.into_values().collect()
    }
}
