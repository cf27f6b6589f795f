use std::io::IsTerminal;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::{Map, Number};
use xmlrpc_codec::{datetime, Value};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CallOutput<'a> {
    method: &'a str,
    result: serde_json::Value,
}

/// Maps a decoded wire value onto JSON. Timestamps become their
/// `dateTime.iso8601` text and binary data becomes standard base64.
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(n) => serde_json::Value::from(*n),
        Value::String(s) => serde_json::Value::from(s.as_str()),
        Value::Bool(b) => serde_json::Value::from(*b),
        Value::Double(d) => Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::DateTime(ts) => serde_json::Value::from(datetime::format(ts)),
        Value::Base64(bytes) => serde_json::Value::from(STANDARD.encode(bytes)),
        Value::Array(items) => items.iter().map(to_json).collect(),
        Value::Struct(members) => {
            let object: Map<String, serde_json::Value> = members
                .iter()
                .map(|(name, value)| (name.clone(), to_json(value)))
                .collect();
            serde_json::Value::Object(object)
        }
    }
}

/// Single-line rendering used inside table cells.
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Struct(_) => to_json(value).to_string(),
        other => match to_json(other) {
            serde_json::Value::String(s) => s,
            json => json.to_string(),
        },
    }
}

fn value_table(value: &Value) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    match value {
        Value::Struct(members) => {
            table.set_header(vec!["MEMBER", "VALUE"]);
            for (name, value) in members {
                table.add_row(vec![name.clone(), cell(value)]);
            }
        }
        Value::Array(items) => {
            table.set_header(vec!["INDEX", "VALUE"]);
            for (index, value) in items.iter().enumerate() {
                table.add_row(vec![index.to_string(), cell(value)]);
            }
        }
        scalar => {
            table
                .set_header(vec!["TYPE", "VALUE"])
                .add_row(vec![scalar.kind().to_string(), cell(scalar)]);
        }
    }
    table
}

fn print_json<T: Serialize>(out: &T, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(out)
    } else {
        serde_json::to_string(out)
    };
    println!("{}", text.unwrap_or_else(|_| "{}".to_string()));
}

/// Prints one call result. `None` is a response that carried no params.
pub fn print_result(method: &str, value: Option<&Value>, format: OutputFormat) {
    let json = value.map(to_json).unwrap_or(serde_json::Value::Null);
    match format {
        OutputFormat::Json => print_json(
            &CallOutput {
                method,
                result: json,
            },
            false,
        ),
        OutputFormat::Pretty => print_json(&json, true),
        OutputFormat::Table => match value {
            Some(value) => println!("{}", value_table(value)),
            None => println!("{method}: no result"),
        },
    }
}

pub fn print_results(methods: &[String], values: &[Value], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<CallOutput<'_>> = methods
                .iter()
                .zip(values)
                .map(|(method, value)| CallOutput {
                    method,
                    result: to_json(value),
                })
                .collect();
            print_json(&out, false);
        }
        OutputFormat::Pretty => {
            for (method, value) in methods.iter().zip(values) {
                println!("{method}:");
                print_json(&to_json(value), true);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "METHOD", "RESULT"]);
            for (index, (method, value)) in methods.iter().zip(values).enumerate() {
                table.add_row(vec![index.to_string(), method.clone(), cell(value)]);
            }
            println!("{table}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn scalars_map_onto_json() {
        assert_eq!(to_json(&Value::Int(7)), serde_json::json!(7));
        assert_eq!(to_json(&Value::Bool(true)), serde_json::json!(true));
        assert_eq!(to_json(&Value::Double(1.5)), serde_json::json!(1.5));
        assert_eq!(to_json(&Value::Base64(b"hi".to_vec())), serde_json::json!("aGk="));
    }

    #[test]
    fn timestamps_keep_wire_layout() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(8, 5, 0))
            .unwrap();
        assert_eq!(to_json(&Value::DateTime(ts)), serde_json::json!("20240309T08:05:00"));
    }

    #[test]
    fn nested_values_render_compactly_in_cells() {
        let mut members = BTreeMap::new();
        members.insert("id".to_string(), Value::Int(1));
        members.insert("tags".to_string(), Value::Array(vec![Value::from("a")]));
        let value = Value::Struct(members);

        assert_eq!(cell(&Value::from("plain")), "plain");
        assert_eq!(cell(&value), r#"{"id":1,"tags":["a"]}"#);
        assert_eq!(
            to_json(&value),
            serde_json::json!({"id": 1, "tags": ["a"]})
        );
    }
}
