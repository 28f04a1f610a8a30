use serde_json::Value;
use tabled::{builder::Builder, Table};

const SUMMARY_METRICS: [(&str, &str); 4] = [
    ("gross_tvpi", "Gross TVPI"),
    ("net_tvpi", "Net TVPI"),
    ("dpi_net", "Net DPI"),
    ("irr_net", "Net IRR"),
];

const SUMMARY_STATS: [&str; 8] = ["mean", "p10", "p25", "p50", "p75", "p90", "min", "max"];

const THRESHOLDS: [(&str, &str); 3] = [
    ("prob_return_fund", "P(return the fund)"),
    ("prob_2x", "P(2x net)"),
    ("prob_3x", "P(3x net)"),
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_footer(map);
            } else {
                print_fields(value);
            }
        }
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    if let Some(summary) = monte_carlo_summary_table(result) {
        println!("{}", summary);
        if let Some(thresholds) = threshold_table(result) {
            println!("\n{}", thresholds);
        }
    } else {
        print_fields(result);
    }
}

/// Metric x statistic grid; None when the value is not a Monte Carlo
/// result, letting the field/value fallback take over.
fn monte_carlo_summary_table(result: &Value) -> Option<Table> {
    let map = result.as_object()?;
    if !SUMMARY_METRICS
        .iter()
        .all(|(key, _)| map.get(*key).is_some_and(|v| v.is_object()))
    {
        return None;
    }

    let mut builder = Builder::default();
    let mut header = vec!["Metric".to_string()];
    header.extend(SUMMARY_STATS.iter().map(|s| s.to_uppercase()));
    builder.push_record(header);

    for (key, label) in SUMMARY_METRICS {
        let summary = map.get(key)?.as_object()?;
        let mut row = vec![label.to_string()];
        for stat in SUMMARY_STATS {
            row.push(
                summary
                    .get(stat)
                    .and_then(Value::as_f64)
                    .map(format_stat)
                    .unwrap_or_default(),
            );
        }
        builder.push_record(row);
    }

    Some(Table::from(builder))
}

fn threshold_table(result: &Value) -> Option<Table> {
    let map = result.as_object()?;
    let mut builder = Builder::default();
    builder.push_record(["Threshold", "Probability"]);
    for (key, label) in THRESHOLDS {
        let p = map.get(key)?.as_f64()?;
        builder.push_record([label.to_string(), format!("{:.1}%", p * 100.0)]);
    }
    Some(Table::from(builder))
}

fn print_fields(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", value);
    }
}

fn print_envelope_footer(envelope: &serde_json::Map<String, Value>) {
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

    if let Some(Value::String(methodology)) = envelope.get("methodology") {
        println!("\nMethodology: {}", methodology);
    }
}

fn format_stat(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.4}", v)
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
