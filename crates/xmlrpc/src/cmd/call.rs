use tracing::debug;
use xmlrpc_codec::Value;

use crate::cmd::{parse_params, CallArgs, ConnectArgs};
use crate::exit::{client_error, CliResult, SUCCESS};
use crate::output::{print_result, OutputFormat};

pub fn run(args: CallArgs, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    let params = parse_params(args.params.as_deref())?;
    let client = connect.connect()?;
    debug!(method = %args.method, params = params.len(), "calling");

    let result: Option<Value> = client
        .call(&args.method, params)
        .map_err(|err| client_error("call failed", err))?;
    client.close();

    print_result(&args.method, result.as_ref(), format);
    Ok(SUCCESS)
}
