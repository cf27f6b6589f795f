//! One `system.multicall` round trip filling destinations of different types.
//!
//! Run with (against an rTorrent SCGI/XML-RPC bridge, for instance):
//!   cargo run --example multicall --features derive -- http://127.0.0.1:5000/RPC2 <HASH>

use xmlrpc::codec::Call;
use xmlrpc::{BlockingClient, Destination, XmlRpc};

#[derive(Debug, Default, XmlRpc)]
#[xmlrpc(crate = "xmlrpc::codec")]
struct Throttle {
    #[xmlrpc(rename = "up.rate")]
    up_rate: i64,
    #[xmlrpc(rename = "down.rate")]
    down_rate: i64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:5000/RPC2".to_string());
    let hash = args.next().unwrap_or_default();

    let client = BlockingClient::connect(&url)?;
    let calls = [
        Call::new("d.name", (hash.as_str(),))?,
        Call::new("d.size_files", (hash.as_str(),))?,
        Call::new("throttle.status", ())?,
    ];

    let mut name = String::new();
    let mut files = 0i64;
    let mut throttle = Throttle::default();
    let mut slots: [&mut dyn Destination; 3] = [&mut name, &mut files, &mut throttle];

    match client.multicall(&calls, &mut slots) {
        Ok(()) => eprintln!("{name}: {files} files, throttle {throttle:?}"),
        Err(err) if err.fault().is_some() => eprintln!("batch stopped: {err}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
