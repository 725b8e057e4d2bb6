//! Normalizer - stable textual rendering of error values

use chrono::Local;
use serde::Serialize;

use contracts::ErrorValue;

/// Expanded form of an error, with process details
#[derive(Serialize)]
struct Expanded<'a> {
    error: &'a ErrorValue,
    pid: u32,
}

/// Render an error as a pretty JSON document.
///
/// Every sink uses this rendering, so it must stay stable.
pub fn render(error: &ErrorValue) -> String {
    let expanded = Expanded {
        error,
        pid: std::process::id(),
    };
    serde_json::to_string_pretty(&expanded).unwrap_or_else(|_| error.to_string())
}

/// Prefix a message with the current local time: `[<rfc2822>] msg`
pub fn timestamp(message: &str) -> String {
    format!("[{}] {}", Local::now().to_rfc2822(), message)
}

/// Escape text for embedding in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ErrorReport;

    #[test]
    fn test_render_message() {
        let rendered = render(&ErrorValue::from("boom"));
        let doc: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(doc["error"], "boom");
        assert_eq!(doc["pid"], std::process::id());
        // pretty printed
        assert!(rendered.contains('\n'));
    }

    #[test]
    fn test_render_report_lists_chain() {
        let report = ErrorReport::new("request failed")
            .with_kind("HttpError")
            .with_cause("connection reset");
        let rendered = render(&ErrorValue::from(report));
        let doc: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(doc["error"]["message"], "request failed");
        assert_eq!(doc["error"]["kind"], "HttpError");
        assert_eq!(doc["error"]["chain"][0], "connection reset");
        assert!(doc["error"].get("location").is_none());
    }

    #[test]
    fn test_render_is_stable() {
        let value = ErrorValue::from("same");
        assert_eq!(render(&value), render(&value.clone()));
    }

    #[test]
    fn test_timestamp_prefix() {
        let line = timestamp("Error log started.");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Error log started."));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>a & b</b>"), "&lt;b&gt;a &amp; b&lt;/b&gt;");
        assert_eq!(escape_html(r#""quoted""#), r#""quoted""#);
    }
}
