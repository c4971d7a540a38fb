#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ewpe_smart::cipher::{self, GENERAL_KEY};
use serde_json::{Value, json};

pub const MAC: &str = "502cc6a1b2c3";
pub const SESSION_KEY: &str = "Zx98Cv76Bn54Ma32";
pub const CLIENT_TIMEOUT: Duration = Duration::from_millis(300);

/// What the simulated unit knows and what it has been told.
#[derive(Debug, Default)]
pub struct State {
    pub values: BTreeMap<String, i32>,
    pub commands: Vec<(Vec<String>, Vec<i32>)>,
    /// Requests to swallow without answering, counted down one per request.
    pub drop_next: u32,
    /// Extra datagrams sent after the unit's own scan reply.
    pub extra_scan_replies: Vec<Vec<u8>>,
    /// Bind requests to swallow, on top of `drop_next`.
    pub drop_binds: u32,
    pub scans: u32,
    pub binds: u32,
}

/// An air conditioner answering on a loopback socket from its own thread.
pub struct SimulatedAc {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedAc {
    pub fn start() -> Self {
        let mut values = BTreeMap::new();
        for (field, value) in [
            ("Pow", 1),
            ("Mod", 1),
            ("SetTem", 24),
            ("WdSpd", 0),
            ("Lig", 1),
            ("SwUpDn", 0),
            ("TemUn", 0),
            ("TemRec", 0),
            ("TemSen", 65),
        ] {
            values.insert(field.to_string(), value);
        }
        Self::with_state(State {
            values,
            ..State::default()
        })
    }

    pub fn with_state(state: State) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let addr = socket.local_addr().unwrap();
        let state = Arc::new(Mutex::new(state));
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let state = state.clone();
            let stop = stop.clone();
            thread::spawn(move || serve(socket, state, stop))
        };

        Self {
            addr,
            state,
            stop,
            handle: Some(handle),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn set(&self, field: &str, value: i32) {
        self.state().values.insert(field.to_string(), value);
    }
}

impl Drop for SimulatedAc {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn sealed(pack: &Value, key: &[u8], cid: &str) -> Vec<u8> {
    json!({
        "t": "pack",
        "i": 0,
        "uid": 0,
        "cid": cid,
        "tcid": "",
        "pack": cipher::encrypt(key, &pack.to_string()).unwrap(),
    })
    .to_string()
    .into_bytes()
}

pub fn scan_pack(mac: &str, brand: &str, name: &str) -> Value {
    json!({
        "t": "dev",
        "cid": mac,
        "bc": "",
        "brand": brand,
        "catalog": "gree",
        "mac": mac,
        "mid": "10001",
        "model": "gree",
        "name": name,
        "series": "gree",
        "vender": "1",
        "ver": "V1.2.1",
        "lock": 0,
    })
}

fn serve(socket: UdpSocket, state: Arc<Mutex<State>>, stop: Arc<AtomicBool>) {
    let mut buf = [0u8; 2048];
    while !stop.load(Ordering::Relaxed) {
        let (len, from) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                continue;
            }
            Err(_) => return,
        };
        let Ok(request) = serde_json::from_slice::<Value>(&buf[..len]) else {
            continue;
        };

        let mut state = state.lock().unwrap();
        if state.drop_next > 0 {
            state.drop_next -= 1;
            continue;
        }
        for reply in answer(&request, &mut state) {
            let _ = socket.send_to(&reply, from);
        }
    }
}

fn answer(request: &Value, state: &mut State) -> Vec<Vec<u8>> {
    if request["t"] == "scan" {
        state.scans += 1;
        let mut replies = vec![sealed(&scan_pack(MAC, "gree", "Living Room"), GENERAL_KEY, MAC)];
        replies.extend(state.extra_scan_replies.iter().cloned());
        return replies;
    }

    let Some(ciphertext) = request["pack"].as_str() else {
        return vec![];
    };
    let key: &[u8] = if request["i"] == 1 {
        GENERAL_KEY
    } else {
        SESSION_KEY.as_bytes()
    };
    let Ok(plain) = cipher::decrypt(key, ciphertext) else {
        return vec![];
    };
    let Ok(pack) = serde_json::from_str::<Value>(&plain) else {
        return vec![];
    };

    let reply = match pack["t"].as_str() {
        Some("bind") => {
            if state.drop_binds > 0 {
                state.drop_binds -= 1;
                return vec![];
            }
            state.binds += 1;
            let reply = json!({ "t": "bindok", "mac": MAC, "key": SESSION_KEY, "r": 200 });
            return vec![sealed(&reply, GENERAL_KEY, MAC)];
        }
        Some("status") => {
            let (cols, dat): (Vec<String>, Vec<i32>) = pack["cols"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .filter_map(|c| state.values.get(c).map(|v| (c.to_string(), *v)))
                .unzip();
            json!({ "t": "dat", "mac": MAC, "r": 200, "cols": cols, "dat": dat })
        }
        Some("cmd") => {
            let opt: Vec<String> = pack["opt"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            let p: Vec<i32> = pack["p"]
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(|v| v.as_i64().map(|n| n as i32))
                .collect();
            for (field, value) in opt.iter().zip(&p) {
                state.values.insert(field.clone(), *value);
            }
            state.commands.push((opt.clone(), p.clone()));
            json!({ "t": "res", "mac": MAC, "r": 200, "opt": opt, "p": p, "val": p })
        }
        _ => return vec![],
    };
    vec![sealed(&reply, SESSION_KEY.as_bytes(), MAC)]
}
