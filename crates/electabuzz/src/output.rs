use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use electabuzz_frame::ResultCode;
use electabuzz_value::{DataType, ReadResults, Value};
use serde::Serialize;

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
struct DatapointOutput {
    id: String,
    result: Option<&'static str>,
    value: serde_json::Value,
    elements: usize,
}

#[derive(Serialize)]
struct WriteOutput {
    id: String,
    data_type: &'static str,
    value: serde_json::Value,
    result: &'static str,
}

#[derive(Serialize)]
struct RosterOutput {
    result: &'static str,
    clients: serde_json::Value,
}

#[derive(Serialize)]
struct PingOutput<'a> {
    host: &'a str,
    port: u16,
    rtt_ms: f64,
}

/// Datapoint ids are printed the way the multiplexer documentation lists them.
pub fn format_id(id: u16) -> String {
    format!("0x{id:04X}")
}

pub fn print_read_results(results: &ReadResults, format: OutputFormat) {
    let rows: Vec<DatapointOutput> = results
        .iter()
        .map(|(id, outcome)| DatapointOutput {
            id: format_id(id),
            result: outcome.map(|o| o.result_code.name()),
            value: outcome
                .and_then(|o| o.value.as_ref())
                .map(value_to_json)
                .unwrap_or(serde_json::Value::Null),
            elements: outcome.map(|o| o.element_count).unwrap_or(0),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DATAPOINT", "RESULT", "VALUE", "ELEMENTS"]);
            for (id, outcome) in results.iter() {
                table.add_row(vec![
                    format_id(id),
                    outcome
                        .map(|o| o.result_code.name())
                        .unwrap_or("(no answer)")
                        .to_string(),
                    outcome
                        .and_then(|o| o.value.as_ref())
                        .map(Value::to_string)
                        .unwrap_or_default(),
                    outcome.map(|o| o.element_count).unwrap_or(0).to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (id, outcome) in results.iter() {
                let id = format_id(id);
                match outcome {
                    Some(o) => match &o.value {
                        Some(value) => println!("{id} = {value} ({})", o.result_code),
                        None => println!("{id} ({})", o.result_code),
                    },
                    None => println!("{id} (no answer)"),
                }
            }
        }
    }
}

pub fn print_write_result(
    id: u16,
    ty: DataType,
    value: &Value,
    result: ResultCode,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&WriteOutput {
            id: format_id(id),
            data_type: ty.name(),
            value: value_to_json(value),
            result: result.name(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DATAPOINT", "TYPE", "VALUE", "RESULT"])
                .add_row(vec![
                    format_id(id),
                    ty.name().to_string(),
                    value.to_string(),
                    result.name().to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} <- {} ({}) {}", format_id(id), value, ty, result);
        }
    }
}

pub fn print_roster(result: ResultCode, roster: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&RosterOutput {
            result: result.name(),
            clients: value_to_json(roster),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "CLIENT"]);
            match roster {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        table.add_row(vec![i.to_string(), item.to_string()]);
                    }
                }
                Value::Map(entries) => {
                    for (key, val) in entries {
                        table.add_row(vec![key.to_string(), val.to_string()]);
                    }
                }
                Value::Nil => {}
                other => {
                    table.add_row(vec!["0".to_string(), other.to_string()]);
                }
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{roster} ({result})"),
    }
}

pub fn print_ping(host: &str, port: u16, rtt: Duration, format: OutputFormat) {
    let rtt_ms = rtt.as_secs_f64() * 1000.0;
    match format {
        OutputFormat::Json => print_json(&PingOutput { host, port, rtt_ms }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("pong from {host}:{port} in {rtt_ms:.2} ms");
        }
    }
}

fn print_json<T: Serialize>(out: &T) {
    println!(
        "{}",
        serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Convert a datapoint value into JSON for machine-readable output.
///
/// Binary blobs become arrays of byte values; map keys use their display form.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;

    match value {
        Value::Nil => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::F32(v) => float_to_json(f64::from(*v)),
        Value::F64(v) => float_to_json(*v),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bin(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Array(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), value_to_json(v)))
                .collect(),
        ),
        int => match (int.as_u64(), int.as_i64()) {
            (Some(u), _) => Json::from(u),
            (None, Some(i)) => Json::from(i),
            (None, None) => Json::Null,
        },
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
