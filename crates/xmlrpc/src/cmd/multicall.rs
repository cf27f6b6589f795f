use tracing::debug;
use xmlrpc_codec::Call;

use crate::cmd::{parse_params, ConnectArgs, MulticallArgs};
use crate::exit::{client_error, codec_error, CliResult, SUCCESS};
use crate::output::{print_results, OutputFormat};

pub fn run(args: MulticallArgs, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let calls = args
        .calls
        .iter()
        .map(|spec| {
            let params = parse_params(spec.params.as_deref())?;
            Call::new(spec.method.clone(), params).map_err(|err| codec_error("bad arguments", err))
        })
        .collect::<CliResult<Vec<_>>>()?;
    let methods: Vec<String> = calls.iter().map(|call| call.method().to_string()).collect();

    let client = connect.connect()?;
    debug!(calls = calls.len(), "sending batch");
    let values = client
        .multicall_values(&calls)
        .map_err(|err| client_error("multicall failed", err))?;
    client.close();

    print_results(&methods, &values, format);
    Ok(SUCCESS)
}
