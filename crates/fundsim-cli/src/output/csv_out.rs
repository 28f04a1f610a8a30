use serde_json::Value;
use std::io;

/// Write output as CSV to stdout. A Monte Carlo result exports its raw
/// per-run vector as rows; everything else falls back to field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(runs)) = result.as_object().and_then(|m| m.get("runs")) {
        write_runs(&mut wtr, runs);
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
        }
    } else {
        let _ = wtr.write_record([&format_csv_value(result)]);
    }

    let _ = wtr.flush();
}

fn write_runs(wtr: &mut csv::Writer<io::StdoutLock<'_>>, runs: &[Value]) {
    let Some(Value::Object(first)) = runs.first() else {
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);

    for run in runs {
        if let Value::Object(map) = run {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
