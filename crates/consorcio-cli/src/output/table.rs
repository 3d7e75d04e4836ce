use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, flatten_fields};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else if let Some(Value::Array(results)) = map.get("results") {
                print_array_table(results);
            } else {
                print_flat_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    if let Some(Value::String(name)) = envelope.get("nome_cliente") {
        println!("Cliente: {}\n", name);
    }

    match result {
        Value::Object(res_map) => {
            // Insights nest list views under the result; render each on its own
            let (lists, scalars): (Vec<_>, Vec<_>) =
                res_map.iter().partition(|(_, v)| v.is_array());
            let scalar_map: Map<String, Value> = scalars
                .into_iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            print_flat_object(&scalar_map);
            for (key, val) in lists {
                if let Value::Array(rows) = val {
                    println!("\n{}:", key);
                    print_array_table(rows);
                }
            }
        }
        other => println!("{}", cell(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_fields(map) {
        builder.push_record([key, cell(&val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = flatten_fields(first).into_iter().map(|(k, _)| k).collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let fields = flatten_fields(map);
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        fields
                            .iter()
                            .find(|(k, _)| k == h)
                            .map(|(_, v)| cell(v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", cell(item));
        }
    }
}
