use std::env;
use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use ewpe_smart::{AirConClient, Channel, MessageLogMode};

fn main() -> ewpe_smart::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let ip = args
        .get(1)
        .expect("usage: monitor <ip> [--broadcast <addr>] [--log <path>]");
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
    };

    let mut builder = AirConClient::builder(ip.as_str()).on_change(|change| {
        let label = Channel::from_field(&change.field)
            .map(|c| format!("{c:?}"))
            .unwrap_or_else(|| change.field.clone());
        match change.old {
            Some(old) => println!("{label}: {old} -> {}", change.new),
            None => println!("{label}: {}", change.new),
        }
    });
    if let Some(addr) = flag("--broadcast") {
        let addr: IpAddr = addr.parse().expect("--broadcast takes an IPv4 address");
        builder = builder.broadcast(addr);
    }
    if let Some(path) = flag("--log") {
        builder = builder.message_log(MessageLogMode::Diffed, path.as_str());
    }
    let mut client = builder.build()?;

    println!("Scanning for {ip}...");
    client.connect()?;
    if let Some(device) = client.device() {
        println!("Bound to {} ({}). Polling for changes...", device.name(), device.mac());
    }

    loop {
        if let Err(e) = client.refresh() {
            eprintln!("refresh failed: {e}");
        }
        thread::sleep(Duration::from_secs(5));
    }
}
