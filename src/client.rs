use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::command::{self, CommandParams, Outcome, SkipReason};
use crate::device::Device;
use crate::diff::FieldChange;
use crate::finder::DeviceFinder;
use crate::logger::{MessageLogMode, MessageLogger};
use crate::protocol::DISCOVERY_PORT;
use crate::transport::{self, Transport};
use crate::types::{FanSpeed, Mode, VerticalSwing};
use crate::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_MIN_REFRESH: Duration = Duration::from_millis(1000);
const DEFAULT_BIND_TRIES: u32 = 3;
const DEFAULT_COMMAND_TRIES: u32 = 3;

type ChangeCallback = Box<dyn Fn(&FieldChange) + Send + Sync>;
type Built = std::result::Result<CommandParams, SkipReason>;

pub struct AirConClientBuilder {
    ip: String,
    broadcast: IpAddr,
    discovery_port: u16,
    timeout: Duration,
    bind_tries: u32,
    command_tries: u32,
    min_refresh_interval: Duration,
    change_callbacks: Vec<ChangeCallback>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl AirConClientBuilder {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            broadcast: IpAddr::V4(Ipv4Addr::BROADCAST),
            discovery_port: DISCOVERY_PORT,
            timeout: DEFAULT_TIMEOUT,
            bind_tries: DEFAULT_BIND_TRIES,
            command_tries: DEFAULT_COMMAND_TRIES,
            min_refresh_interval: DEFAULT_MIN_REFRESH,
            change_callbacks: Vec::new(),
            log_mode: None,
            log_path: None,
        }
    }

    pub fn broadcast(mut self, addr: IpAddr) -> Self {
        self.broadcast = addr;
        self
    }

    pub fn discovery_port(mut self, port: u16) -> Self {
        self.discovery_port = port;
        self
    }

    /// Read timeout of the socket opened by [`build`](Self::build).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bind_tries(mut self, tries: u32) -> Self {
        self.bind_tries = tries;
        self
    }

    pub fn command_tries(mut self, tries: u32) -> Self {
        self.command_tries = tries;
        self
    }

    pub fn min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn on_change(mut self, f: impl Fn(&FieldChange) + Send + Sync + 'static) -> Self {
        self.change_callbacks.push(Box::new(f));
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<AirConClient<UdpSocket>> {
        let socket = transport::open_socket(self.timeout)?;
        self.build_with_transport(socket)
    }

    /// Use a caller-owned transport; its receive timeout is the caller's.
    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<AirConClient<T>> {
        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => Some(MessageLogger::new(mode, &path)?),
            _ => None,
        };

        Ok(AirConClient {
            transport,
            finder: DeviceFinder::new(self.broadcast).port(self.discovery_port),
            ip: self.ip,
            bind_tries: self.bind_tries.max(1),
            command_tries: self.command_tries.max(1),
            min_refresh_interval: self.min_refresh_interval,
            last_refresh: None,
            device: None,
            change_callbacks: self.change_callbacks,
            logger,
        })
    }
}

/// One air conditioner reached over one socket.
///
/// Adds the policy the bare [`Device`] leaves to its caller: retries on
/// timeout, refresh rate limiting and change notification. All I/O is
/// blocking and goes through a single socket, so one client serves one
/// thread.
pub struct AirConClient<T: Transport = UdpSocket> {
    transport: T,
    finder: DeviceFinder,
    ip: String,
    bind_tries: u32,
    command_tries: u32,
    min_refresh_interval: Duration,
    last_refresh: Option<Instant>,
    device: Option<Device>,
    change_callbacks: Vec<ChangeCallback>,
    logger: Option<MessageLogger>,
}

impl AirConClient<UdpSocket> {
    pub fn builder(ip: impl Into<String>) -> AirConClientBuilder {
        AirConClientBuilder::new(ip)
    }
}

impl<T: Transport> AirConClient<T> {
    /// Scan for the configured address and bind to it. The scan and bind are
    /// repeated on timeout, up to the configured number of tries.
    pub fn connect(&mut self) -> Result<()> {
        let mut attempt = 1;
        let device = loop {
            match self.try_connect() {
                Ok(device) => break device,
                Err(e) if e.is_timeout() && attempt < self.bind_tries => {
                    debug!(ip = %self.ip, attempt, "bind timed out, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!(ip = %self.ip, tries = self.bind_tries, "device offline, could not bind");
                    }
                    return Err(e);
                }
            }
        };

        info!(ip = %self.ip, mac = %device.mac(), name = %device.name(), "device bound");
        self.device = Some(device);
        self.last_refresh = None;
        Ok(())
    }

    fn try_connect(&mut self) -> Result<Device> {
        let registry = self.finder.scan(&self.transport)?;
        debug!(count = registry.len(), "scan complete");
        if let Some(ref mut logger) = self.logger {
            logger.log_scan(&registry);
        }

        let mut device = registry
            .find_by_address(&self.ip)
            .cloned()
            .ok_or_else(|| Error::DeviceNotFound(self.ip.clone()))?;

        let result = device.bind(&self.transport);
        if let Some(ref mut logger) = self.logger {
            logger.log_bind(device.mac(), result.is_ok());
        }
        result.map(|()| device)
    }

    pub fn is_connected(&self) -> bool {
        self.device.as_ref().is_some_and(Device::is_bound)
    }

    pub fn device(&self) -> Option<&Device> {
        self.device.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch status and report what changed since the previous fetch. A call
    /// within the minimum refresh interval of the last one does nothing and
    /// reports no changes.
    pub fn refresh(&mut self) -> Result<Vec<FieldChange>> {
        let Some(device) = self.device.as_mut() else {
            return Err(Error::NotConnected);
        };

        if let Some(last) = self.last_refresh
            && last.elapsed() < self.min_refresh_interval
        {
            trace!("skipping refresh, minimum interval not reached");
            return Ok(Vec::new());
        }
        self.last_refresh = Some(Instant::now());

        device.fetch_status(&self.transport)?;
        let changes = device.changes();

        if let Some(ref mut logger) = self.logger
            && let Some(status) = device.status()
        {
            logger.log_status(device.mac(), status);
        }

        for change in &changes {
            trace!(field = %change.field, old = ?change.old, new = change.new, "field changed");
            for cb in &self.change_callbacks {
                cb(change);
            }
        }
        Ok(changes)
    }

    fn command(&mut self, action: &str, build: impl Fn(&Device) -> Built) -> Result<Outcome> {
        let Some(device) = self.device.as_ref() else {
            return Err(Error::NotConnected);
        };
        let built = build(device);

        let mut attempt = 1;
        let outcome = loop {
            match device.send_validated(&self.transport, built.clone()) {
                Ok(outcome) => break outcome,
                Err(e) if e.is_timeout() && attempt < self.command_tries => {
                    debug!(action, attempt, "command timed out, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!(action, tries = self.command_tries, "could not control device");
                    }
                    return Err(e);
                }
            }
        };

        if let Some(ref mut logger) = self.logger
            && let Ok(params) = &built
        {
            logger.log_command(action, device.mac(), params, &outcome);
        }
        Ok(outcome)
    }

    pub fn set_power(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_power", |_| command::power(i32::from(on)))
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<Outcome> {
        self.command("set_mode", |_| command::mode(mode.as_wire()))
    }

    pub fn set_turbo(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_turbo", |_| command::turbo(i32::from(on)))
    }

    pub fn set_light(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_light", |_| command::light(i32::from(on)))
    }

    /// Degrees in either unit; see [`crate::temperature::reconcile`].
    pub fn set_temperature(&mut self, value: i32) -> Result<Outcome> {
        self.command("set_temperature", |d| Ok(d.temperature_params(value)))
    }

    pub fn set_swing_vertical(&mut self, swing: VerticalSwing) -> Result<Outcome> {
        self.command("set_swing_vertical", |_| command::swing_vertical(swing.as_wire()))
    }

    pub fn set_fan_speed(&mut self, speed: FanSpeed) -> Result<Outcome> {
        self.command("set_fan_speed", |_| command::fan_speed(speed.as_wire()))
    }

    pub fn set_air(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_air", |_| command::air(i32::from(on)))
    }

    pub fn set_dry(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_dry", |_| command::dry(i32::from(on)))
    }

    pub fn set_health(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_health", |_| command::health(i32::from(on)))
    }

    pub fn set_power_save(&mut self, on: bool) -> Result<Outcome> {
        self.command("set_power_save", |_| command::power_save(i32::from(on)))
    }
}
