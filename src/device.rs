use std::net::{IpAddr, SocketAddr};

use tracing::{debug, trace};

use crate::cipher::GENERAL_KEY;
use crate::command::{self, CommandParams, Outcome, SkipReason};
use crate::diff::{FieldChange, diff_snapshots, has_changed};
use crate::protocol::{
    self, BIND_SEQ, BindRequest, BindResponse, CommandRequest, CommandResponse, DEFAULT_SEQ,
    STATUS_COLUMNS, ScanResponse, StatusRequest, StatusResponse,
};
use crate::status::{StatusHistory, StatusSnapshot};
use crate::temperature;
use crate::transport::{self, Transport};
use crate::types::{Channel, FanSpeed, Mode, TemperatureUnit, VerticalSwing};
use crate::{Error, Result};

const SESSION_KEY_LEN: usize = 16;

/// One air conditioner on the LAN.
///
/// The identifier is fixed at discovery. The session key is present exactly
/// when the device is bound; every command and status call is a no-op until
/// then.
#[derive(Debug, Clone)]
pub struct Device {
    mac: String,
    name: String,
    addr: SocketAddr,
    info: ScanResponse,
    session_key: Option<Vec<u8>>,
    raw_status: Option<StatusSnapshot>,
    status: StatusHistory,
}

impl Device {
    pub fn new(mac: impl Into<String>, name: impl Into<String>, addr: SocketAddr) -> Self {
        let mac = mac.into();
        let name = name.into();
        let info = ScanResponse {
            mac: mac.clone(),
            name: name.clone(),
            ..ScanResponse::default()
        };
        Self::build(info, addr)
    }

    pub fn from_scan(info: ScanResponse, addr: SocketAddr) -> Self {
        Self::build(info, addr)
    }

    fn build(info: ScanResponse, addr: SocketAddr) -> Self {
        Self {
            mac: info.mac.clone(),
            name: info.name.clone(),
            addr,
            info,
            session_key: None,
            raw_status: None,
            status: StatusHistory::default(),
        }
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ip(&self) -> IpAddr {
        self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Everything the device said about itself in its scan reply.
    pub fn info(&self) -> &ScanResponse {
        &self.info
    }

    pub fn is_bound(&self) -> bool {
        self.session_key.is_some()
    }

    pub fn session_key(&self) -> Option<&[u8]> {
        self.session_key.as_deref()
    }

    /// Exchange the general key for a per-device session key.
    ///
    /// Repeating a bind replaces the key; status history is kept. On any
    /// failure the device is left as it was.
    pub fn bind<T: Transport + ?Sized>(&mut self, transport: &T) -> Result<()> {
        let request = protocol::encode_request(
            &BindRequest::new(&self.mac),
            &self.mac,
            BIND_SEQ,
            GENERAL_KEY,
        )?;
        debug!(mac = %self.mac, addr = %self.addr, "binding");

        let reply = match transport::exchange(transport, self.addr, &request) {
            Ok(reply) => reply,
            Err(Error::Timeout) => return Err(Error::BindTimeout),
            Err(e) => return Err(e),
        };
        let pack: BindResponse = protocol::decode_response(&reply, GENERAL_KEY)
            .map_err(|e| Error::BindProtocol(e.to_string()))?;
        if pack.key.len() != SESSION_KEY_LEN {
            return Err(Error::BindProtocol(format!(
                "session key must be {SESSION_KEY_LEN} bytes, got {}",
                pack.key.len()
            )));
        }

        trace!(mac = %self.mac, key = %pack.key, "session key received");
        self.session_key = Some(pack.key.into_bytes());
        debug!(mac = %self.mac, "bound");
        Ok(())
    }

    /// Send `params` as one command. The acknowledgement is decoded but does
    /// not change local state.
    pub fn execute_command<T: Transport + ?Sized>(
        &self,
        transport: &T,
        params: &CommandParams,
    ) -> Result<Outcome> {
        let Some(key) = self.session_key.as_deref() else {
            return Ok(Outcome::Skipped(SkipReason::Unbound));
        };
        let pack = CommandRequest {
            opt: params.fields().collect(),
            p: params.values().collect(),
            t: "cmd",
        };
        debug!(mac = %self.mac, opt = ?pack.opt, p = ?pack.p, "sending command");

        let request = protocol::encode_request(&pack, &self.mac, DEFAULT_SEQ, key)?;
        let reply = transport::exchange(transport, self.addr, &request)?;
        let ack: CommandResponse = protocol::decode_response(&reply, key)?;
        trace!(mac = %self.mac, r = ack.r, "command acknowledged");
        Ok(Outcome::Sent)
    }

    /// Send a builder's result: skipped without I/O when unbound or when the
    /// builder rejected its value.
    pub fn send_validated<T: Transport + ?Sized>(
        &self,
        transport: &T,
        built: std::result::Result<CommandParams, SkipReason>,
    ) -> Result<Outcome> {
        if !self.is_bound() {
            debug!(mac = %self.mac, "not bound, dropping command");
            return Ok(Outcome::Skipped(SkipReason::Unbound));
        }
        match built {
            Ok(params) => self.execute_command(transport, &params),
            Err(reason) => {
                debug!(mac = %self.mac, ?reason, "dropping invalid command");
                Ok(Outcome::Skipped(reason))
            }
        }
    }

    pub fn set_power<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::power(value))
    }

    pub fn set_mode<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::mode(value))
    }

    pub fn set_turbo<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::turbo(value))
    }

    pub fn set_light<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::light(value))
    }

    pub fn set_swing_vertical<T: Transport + ?Sized>(
        &self,
        transport: &T,
        value: i32,
    ) -> Result<Outcome> {
        self.send_validated(transport, command::swing_vertical(value))
    }

    pub fn set_fan_speed<T: Transport + ?Sized>(
        &self,
        transport: &T,
        value: i32,
    ) -> Result<Outcome> {
        self.send_validated(transport, command::fan_speed(value))
    }

    pub fn set_air<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::air(value))
    }

    pub fn set_dry<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::dry(value))
    }

    pub fn set_health<T: Transport + ?Sized>(&self, transport: &T, value: i32) -> Result<Outcome> {
        self.send_validated(transport, command::health(value))
    }

    pub fn set_power_save<T: Transport + ?Sized>(
        &self,
        transport: &T,
        value: i32,
    ) -> Result<Outcome> {
        self.send_validated(transport, command::power_save(value))
    }

    /// Set the target temperature in whichever unit `value` plausibly is.
    /// See [`temperature::reconcile`].
    pub fn set_temperature<T: Transport + ?Sized>(
        &self,
        transport: &T,
        value: i32,
    ) -> Result<Outcome> {
        self.send_validated(transport, Ok(self.temperature_params(value)))
    }

    /// `TemUn`/`SetTem`/`TemRec` for `value`, reconciled against the unit in
    /// the last status read.
    pub fn temperature_params(&self, value: i32) -> CommandParams {
        let prior = self.status().and_then(StatusSnapshot::unit);
        let target = temperature::reconcile(value, prior);
        debug!(mac = %self.mac, requested = value, ?target, "set point resolved");
        target.to_params()
    }

    /// Read all known columns. On success the previous snapshot is demoted;
    /// on failure nothing changes.
    pub fn fetch_status<T: Transport + ?Sized>(&mut self, transport: &T) -> Result<Outcome> {
        let Some(key) = self.session_key.as_deref() else {
            return Ok(Outcome::Skipped(SkipReason::Unbound));
        };
        let request = protocol::encode_request(
            &StatusRequest::new(&self.mac, &STATUS_COLUMNS),
            &self.mac,
            DEFAULT_SEQ,
            key,
        )?;
        trace!(mac = %self.mac, "requesting status");

        let reply = transport::exchange(transport, self.addr, &request)?;
        let pack: StatusResponse = protocol::decode_response(&reply, key)?;
        let raw = StatusSnapshot::from_response(pack)?;

        self.status.push(raw.displayed());
        self.raw_status = Some(raw);
        Ok(Outcome::Sent)
    }

    /// Latest status with the set point in the display unit.
    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.current()
    }

    pub fn previous_status(&self) -> Option<&StatusSnapshot> {
        self.status.previous()
    }

    /// Latest status exactly as the device sent it.
    pub fn raw_status(&self) -> Option<&StatusSnapshot> {
        self.raw_status.as_ref()
    }

    pub fn int_status(&self, field: &str) -> Option<i32> {
        self.status()?.get(field)
    }

    pub fn has_changed(&self, field: &str) -> Option<bool> {
        has_changed(self.status.previous(), self.status.current(), field)
    }

    pub fn has_channel_changed(&self, channel: Channel) -> Option<bool> {
        self.has_changed(channel.field())
    }

    pub fn changes(&self) -> Vec<FieldChange> {
        match self.status.current() {
            Some(current) => diff_snapshots(self.status.previous(), current),
            None => Vec::new(),
        }
    }

    fn flag(&self, field: &str) -> Option<bool> {
        self.int_status(field).map(|v| v == 1)
    }

    pub fn power(&self) -> Option<bool> {
        self.flag("Pow")
    }

    pub fn mode(&self) -> Option<Mode> {
        self.int_status("Mod").and_then(Mode::from_wire)
    }

    pub fn turbo(&self) -> Option<bool> {
        self.flag("Tur")
    }

    pub fn light(&self) -> Option<bool> {
        self.flag("Lig")
    }

    /// Set point in the unit reported by [`Device::temperature_unit`].
    pub fn target_temperature(&self) -> Option<i32> {
        self.int_status("SetTem")
    }

    pub fn temperature_unit(&self) -> Option<TemperatureUnit> {
        self.status()?.unit()
    }

    pub fn temperature_sensor(&self) -> Option<i32> {
        self.int_status("TemSen")
    }

    pub fn swing_vertical(&self) -> Option<VerticalSwing> {
        self.int_status("SwUpDn").and_then(VerticalSwing::from_wire)
    }

    pub fn fan_speed(&self) -> Option<FanSpeed> {
        self.int_status("WdSpd").and_then(FanSpeed::from_wire)
    }

    pub fn air(&self) -> Option<bool> {
        self.flag("Air")
    }

    pub fn dry(&self) -> Option<bool> {
        self.flag("Blo")
    }

    pub fn health(&self) -> Option<bool> {
        self.flag("Health")
    }

    pub fn power_save(&self) -> Option<bool> {
        self.flag("SvSt")
    }
}
