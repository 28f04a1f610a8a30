use serde_json::Value;

/// Print just the headline number from the output: the median net TVPI for
/// a Monte Carlo result, otherwise the first recognised fund metric.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result {
        // Monte Carlo results headline on the median net multiple
        if let Some(p50) = map
            .get("net_tvpi")
            .and_then(|s| s.as_object())
            .and_then(|s| s.get("p50"))
        {
            println!("{}", format_minimal(p50));
            return;
        }

        // Flat results (single run, IRR solve)
        for key in ["irr", "irr_net", "net_tvpi", "gross_tvpi"] {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
