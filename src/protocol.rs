use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::trace;

use crate::cipher;
use crate::{Error, Result};

pub const DISCOVERY_PORT: u16 = 7000;
pub const VENDOR_BRAND: &str = "gree";
pub const MAX_DATAGRAM_SIZE: usize = 1024;

pub(crate) const BIND_SEQ: u32 = 1;
pub(crate) const DEFAULT_SEQ: u32 = 0;

/// Columns requested on every status fetch.
pub const STATUS_COLUMNS: [&str; 20] = [
    "Pow",
    "Mod",
    "SetTem",
    "WdSpd",
    "Air",
    "Blo",
    "Health",
    "SwhSlp",
    "Lig",
    "SwingLfRig",
    "SwUpDn",
    "Quiet",
    "Tur",
    "StHt",
    "TemUn",
    "TemSen",
    "HeatCoolType",
    "TemRec",
    "SvSt",
    "NoiseSet",
];

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    t: &'static str,
    cid: &'static str,
    i: u32,
    uid: u32,
    tcid: &'a str,
    pack: String,
}

/// Outer envelope of anything a device sends back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub i: Option<i64>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub tcid: Option<String>,
    #[serde(default)]
    pub pack: Option<String>,
}

/// Decrypted pack of a scan reply.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanResponse {
    pub t: String,
    pub cid: String,
    pub bc: String,
    pub brand: String,
    pub catalog: String,
    pub mac: String,
    pub mid: String,
    pub model: String,
    pub name: String,
    pub series: String,
    pub vender: String,
    pub ver: String,
    pub lock: i64,
}

#[derive(Debug, Serialize)]
pub struct BindRequest<'a> {
    pub mac: &'a str,
    pub t: &'static str,
    pub uid: u32,
}

impl<'a> BindRequest<'a> {
    pub fn new(mac: &'a str) -> Self {
        Self { mac, t: "bind", uid: 0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BindResponse {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub mac: String,
    pub key: String,
    #[serde(default)]
    pub r: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusRequest<'a> {
    pub cols: &'a [&'a str],
    pub mac: &'a str,
    pub t: &'static str,
}

impl<'a> StatusRequest<'a> {
    pub fn new(mac: &'a str, cols: &'a [&'a str]) -> Self {
        Self { cols, mac, t: "status" }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub r: i64,
    pub cols: Vec<String>,
    pub dat: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct CommandRequest<'a> {
    pub opt: Vec<&'a str>,
    pub p: Vec<i32>,
    pub t: &'static str,
}

/// Device acknowledgement of a command. Nothing in it feeds back into
/// device state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommandResponse {
    pub t: String,
    pub mac: String,
    pub r: i64,
    pub opt: Vec<String>,
    pub p: Vec<Value>,
    pub val: Vec<Value>,
}

/// The scan request goes out as bare JSON; devices answer with a pack
/// sealed under the general key.
pub fn scan_request() -> Vec<u8> {
    json!({ "t": "scan" }).to_string().into_bytes()
}

pub fn encode_request<P: Serialize>(pack: &P, tcid: &str, i: u32, key: &[u8]) -> Result<Vec<u8>> {
    let plain =
        serde_json::to_string(pack).map_err(|e| Error::Encryption(format!("serialize pack: {e}")))?;
    trace!(tcid, pack = %plain, "sealing pack");
    let envelope = RequestEnvelope {
        t: "pack",
        cid: "app",
        i,
        uid: 0,
        tcid,
        pack: cipher::encrypt(key, &plain)?,
    };
    serde_json::to_vec(&envelope).map_err(|e| Error::Encryption(format!("serialize envelope: {e}")))
}

pub fn decode_envelope(bytes: &[u8]) -> Result<ResponseEnvelope> {
    serde_json::from_slice(trim_datagram(bytes)).map_err(|e| Error::MalformedEnvelope(e.to_string()))
}

/// Parse the outer envelope and decrypt its pack, returning the plaintext.
pub fn open_pack(bytes: &[u8], key: &[u8]) -> Result<String> {
    let envelope = decode_envelope(bytes)?;
    let pack = envelope.pack.ok_or(Error::MissingPack)?;
    let plain = cipher::decrypt(key, &pack)?;
    trace!(pack = %plain, "opened pack");
    Ok(plain)
}

pub fn decode_response<P: DeserializeOwned>(bytes: &[u8], key: &[u8]) -> Result<P> {
    let plain = open_pack(bytes, key)?;
    serde_json::from_str(&plain).map_err(|e| Error::MalformedPack(e.to_string()))
}

// Datagrams read into fixed buffers can carry trailing NULs.
fn trim_datagram(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| *b != 0 && !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &bytes[..end]
}
