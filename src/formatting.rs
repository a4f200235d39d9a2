//! Helpers for rendering metrics in the Prometheus [exposition format].
//!
//! [exposition format]: https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md#text-format-details

use std::fmt::Write as _;

use crate::label::LabelSet;

/// Writes a metric type line.
pub(crate) fn write_type_line(buffer: &mut String, name: &str, metric_type: &str) {
    buffer.push_str("# TYPE ");
    buffer.push_str(name);
    buffer.push(' ');
    buffer.push_str(metric_type);
    buffer.push('\n');
}

/// Writes a help (description) line.
pub(crate) fn write_help_line(buffer: &mut String, name: &str, help: &str) {
    buffer.push_str("# HELP ");
    buffer.push_str(name);
    buffer.push(' ');
    buffer.push_str(&escape_help(help));
    buffer.push('\n');
}

/// Writes one value line: the metric name, the brace-delimited label list if
/// any labels are present, and the value with six fixed decimal digits.
pub(crate) fn write_metric_line(buffer: &mut String, name: &str, labels: &LabelSet, value: f64) {
    buffer.push_str(name);

    if !labels.is_empty() {
        buffer.push('{');

        let mut first = true;
        for label in labels.iter() {
            if first {
                first = false;
            } else {
                buffer.push(',');
            }
            buffer.push_str(label.key());
            buffer.push_str("=\"");
            buffer.push_str(&escape_label_value(label.value()));
            buffer.push('"');
        }

        buffer.push('}');
    }

    buffer.push(' ');
    let _ = write!(buffer, "{value:.6}");
    buffer.push('\n');
}

/// Escapes backslashes, double quotes, and line feeds in a label value.
pub(crate) fn escape_label_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Escapes backslashes and line feeds in help text. Double quotes are valid
/// in descriptions and pass through untouched.
pub(crate) fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}
