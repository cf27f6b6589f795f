use std::time::Duration;

use clap::{Args, Subcommand};
use xmlrpc_client::BlockingClient;
use xmlrpc_codec::Value;
use xmlrpc_transport::TransportConfig;

use crate::exit::{client_error, CliError, CliResult};
use crate::output::OutputFormat;

pub mod call;
pub mod multicall;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call one remote method and print its result.
    Call(CallArgs),
    /// Send several calls as one system.multicall batch.
    Multicall(MulticallArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connect: &ConnectArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Call(args) => call::run(args, connect, format),
        Command::Multicall(args) => multicall::run(args, connect, format),
        Command::Version(args) => version::run(args),
    }
}

/// Endpoint flags shared by every remote command.
#[derive(Args, Debug, Clone)]
pub struct ConnectArgs {
    /// Endpoint URL (http or https).
    #[arg(long, env = "XMLRPC_URL", global = true)]
    pub url: Option<String>,
    /// Basic-auth user name.
    #[arg(long, env = "XMLRPC_USER", global = true)]
    pub user: Option<String>,
    /// Basic-auth password.
    #[arg(long, env = "XMLRPC_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,
    /// Request timeout (e.g. 30s, 500ms).
    #[arg(long, env = "XMLRPC_TIMEOUT", default_value = "30s", global = true)]
    pub timeout: String,
}

impl ConnectArgs {
    pub fn transport_config(&self) -> CliResult<TransportConfig> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| CliError::usage("no endpoint: pass --url or set XMLRPC_URL"))?;
        let mut config = TransportConfig::new(url)
            .with_timeout(Some(parse_timeout(&self.timeout)?))
            .with_user_agent(concat!("xmlrpc-cli/", env!("CARGO_PKG_VERSION")));
        if let Some(user) = &self.user {
            config = config.with_basic_auth(user.clone(), self.password.clone());
        } else if self.password.is_some() {
            return Err(CliError::usage("--password requires --user"));
        }
        Ok(config)
    }

    pub fn connect(&self) -> CliResult<BlockingClient> {
        let config = self.transport_config()?;
        BlockingClient::connect_with_config(config)
            .map_err(|err| client_error("connect failed", err))
    }
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Remote method name.
    pub method: String,
    /// Call arguments as a JSON array.
    #[arg(long, short = 'p', value_name = "JSON-ARRAY")]
    pub params: Option<String>,
}

#[derive(Args, Debug)]
pub struct MulticallArgs {
    /// A call in the batch, as METHOD or METHOD=JSON-ARRAY. Repeatable.
    #[arg(
        long = "call",
        short = 'c',
        value_name = "METHOD[=JSON-ARRAY]",
        required = true,
        value_parser = parse_call_spec
    )]
    pub calls: Vec<CallSpec>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// One `--call` entry before its arguments are converted.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    pub method: String,
    pub params: Option<String>,
}

fn parse_call_spec(input: &str) -> Result<CallSpec, String> {
    let (method, params) = match input.split_once('=') {
        Some((method, params)) => (method, Some(params.to_string())),
        None => (input, None),
    };
    let method = method.trim();
    if method.is_empty() {
        return Err("method name must not be empty".to_string());
    }
    Ok(CallSpec {
        method: method.to_string(),
        params,
    })
}

/// Parses a JSON array of call arguments. Absent means no arguments.
pub fn parse_params(input: Option<&str>) -> CliResult<Vec<Value>> {
    let Some(input) = input else {
        return Ok(Vec::new());
    };
    let json: serde_json::Value = serde_json::from_str(input)
        .map_err(|err| CliError::usage(format!("invalid params JSON: {err}")))?;
    match json {
        serde_json::Value::Array(items) => items.into_iter().map(from_json).collect(),
        _ => Err(CliError::usage("params must be a JSON array")),
    }
}

/// Integers become `int`, other numbers `double`, objects `struct`.
pub fn from_json(json: serde_json::Value) -> CliResult<Value> {
    Ok(match json {
        serde_json::Value::Null => {
            return Err(CliError::usage("null has no XML-RPC representation"));
        }
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if n.is_u64() {
                return Err(CliError::usage(format!("integer {n} does not fit in i64")));
            } else {
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect::<CliResult<_>>()?)
        }
        serde_json::Value::Object(members) => Value::Struct(
            members
                .into_iter()
                .map(|(name, value)| Ok((name, from_json(value)?)))
                .collect::<CliResult<_>>()?,
        ),
    })
}

pub fn parse_timeout(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("timeout must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid timeout value: {input}")))?;

    if value == 0 {
        return Err(CliError::usage("timeout must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::USAGE;

    #[test]
    fn parse_timeout_seconds() {
        assert_eq!(parse_timeout("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_timeout("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_timeout_millis() {
        assert_eq!(parse_timeout("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_timeout_rejects_zero_and_garbage() {
        assert_eq!(parse_timeout("0s").unwrap_err().code, USAGE);
        assert_eq!(parse_timeout("soon").unwrap_err().code, USAGE);
        assert_eq!(parse_timeout(" ").unwrap_err().code, USAGE);
    }

    #[test]
    fn json_numbers_split_into_int_and_double() {
        let params = parse_params(Some(r#"[1, -7, 2.5, "x", true]"#)).unwrap();
        assert_eq!(
            params,
            vec![
                Value::Int(1),
                Value::Int(-7),
                Value::Double(2.5),
                Value::from("x"),
                Value::Bool(true),
            ]
        );
        assert!(parse_params(Some("[18446744073709551615]")).is_err());
    }

    #[test]
    fn json_objects_become_structs() {
        let params = parse_params(Some(r#"[{"ids": [1, 2], "name": "b"}]"#)).unwrap();
        let Value::Struct(members) = &params[0] else {
            panic!("expected struct, got {:?}", params[0]);
        };
        assert_eq!(
            members.get("ids"),
            Some(&Value::Array(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(members.get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn params_must_be_an_array_without_nulls() {
        assert!(parse_params(None).unwrap().is_empty());
        assert_eq!(parse_params(Some(r#"{"a":1}"#)).unwrap_err().code, USAGE);
        assert_eq!(parse_params(Some("[null]")).unwrap_err().code, USAGE);
        assert_eq!(parse_params(Some("[1,")).unwrap_err().code, USAGE);
    }

    #[test]
    fn call_spec_splits_on_first_equals() {
        assert_eq!(
            parse_call_spec("d.name=[\"a=b\"]").unwrap(),
            CallSpec {
                method: "d.name".into(),
                params: Some("[\"a=b\"]".into()),
            }
        );
        assert_eq!(parse_call_spec("system.listMethods").unwrap().params, None);
        assert!(parse_call_spec("=[1]").is_err());
    }

    #[test]
    fn transport_config_requires_url() {
        let args = ConnectArgs {
            url: None,
            user: None,
            password: None,
            timeout: "30s".into(),
        };
        assert_eq!(args.transport_config().unwrap_err().code, USAGE);

        let args = ConnectArgs {
            url: Some("http://127.0.0.1:8080/RPC2".into()),
            user: None,
            password: Some("secret".into()),
            timeout: "30s".into(),
        };
        assert_eq!(args.transport_config().unwrap_err().code, USAGE);
    }

    #[test]
    fn transport_config_carries_timeout_and_auth() {
        let args = ConnectArgs {
            url: Some("http://127.0.0.1:8080/RPC2".into()),
            user: Some("user".into()),
            password: Some("pass".into()),
            timeout: "750ms".into(),
        };
        let config = args.transport_config().unwrap();
        assert_eq!(config.timeout, Some(Duration::from_millis(750)));
        assert!(config.credentials.is_some());
    }
}
