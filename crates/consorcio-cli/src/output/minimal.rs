use serde_json::Value;

use super::cell;

/// Key figure of each command, in priority order.
const PRIORITY_KEYS: [&str; 4] = [
    "nova_parcela_pos_lance",
    "credito_disponivel",
    "saldo_devedor_base_final",
    "geral",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(results)) = value.get("results") {
        for item in results {
            println!("{}", pick(item));
        }
        return;
    }

    println!("{}", pick(result_obj));
}

fn pick(obj: &Value) -> String {
    if let Value::Object(map) = obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                return match val {
                    Value::Object(_) => serde_json::to_string(val).unwrap_or_default(),
                    other => cell(other),
                };
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, cell(val));
        }
    }
    cell(obj)
}
