//! Text exposition format
//!
//! Serialises samples as `# HELP` / `# TYPE` blocks, one block per metric
//! name in order of first appearance.

use std::collections::HashMap;
use std::fmt::Write;

use crate::metric::Sample;

/// Render samples in the text exposition format
pub fn render(samples: &[Sample]) -> String {
    let mut families: Vec<(&str, Vec<&Sample>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sample in samples {
        let name = sample.descriptor().fq_name();
        match index.get(name) {
            Some(&i) => families[i].1.push(sample),
            None => {
                index.insert(name, families.len());
                families.push((name, vec![sample]));
            }
        }
    }

    let mut out = String::new();
    for (name, samples) in families {
        let descriptor = samples[0].descriptor();
        // writing to a String cannot fail
        let _ = writeln!(out, "# HELP {} {}", name, escape_help(descriptor.help()));
        let _ = writeln!(out, "# TYPE {} {}", name, descriptor.kind());

        for sample in samples {
            out.push_str(name);
            if !sample.label_values().is_empty() {
                out.push('{');
                for (i, (label, value)) in sample.labels().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    let _ = write!(out, "{}=\"{}\"", label, escape_label(value));
                }
                out.push('}');
            }
            let _ = writeln!(out, " {}", format_value(sample.value()));
        }
    }
    out
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value > 0.0 { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else {
        value.to_string()
    }
}
