//! Single calls against an XML-RPC endpoint, awaited in any order.
//!
//! Run with:
//!   cargo run --example basic-call -- https://bugzilla.mozilla.org/xmlrpc.cgi
//!
//! Or from the CLI:
//!   cargo run --features cli -- --url https://bugzilla.mozilla.org/xmlrpc.cgi \
//!     call Bugzilla.version

use std::collections::BTreeMap;

use xmlrpc::{Client, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://bugzilla.mozilla.org/xmlrpc.cgi".to_string());

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let client = Client::connect(&url)?;

        // Both exchanges run at once; each handle resolves to its own reply.
        let version = client.issue("Bugzilla.version", ())?;
        let time = client.issue("Bugzilla.time", ())?;

        let version: BTreeMap<String, String> = version.wait().await?;
        eprintln!("version: {:?}", version.get("version"));

        match time.wait::<Value>().await {
            Ok(time) => eprintln!("server time: {:?}", time.get("db_time")),
            Err(err) if err.fault().is_some() => eprintln!("server refused: {err}"),
            Err(err) => return Err(err.into()),
        }

        client.close();
        Ok::<_, Box<dyn std::error::Error>>(())
    })
}
