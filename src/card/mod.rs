//! Error card rendering
//!
//! Turns the JSON envelope returned by the backend into the HTML card shown
//! to the user. Successful envelopes render to nothing.

mod log;

pub use log::LogStyle;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use thiserror::Error;

use crate::config::FailurePolicy;

/// Backend response: `{ success, error: {...}, logs: [...] }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    /// Any JSON value; only a literal `true` suppresses the card
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self.success, Some(Value::Bool(true)))
    }
}

/// The `error` object of an envelope. Fields are kept as raw JSON values
/// since the backend mixes numeric and string codes. `None` means the key
/// was absent; an explicit `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, deserialize_with = "present")]
    pub code: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub dev_message: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub user_message: Option<Value>,
    /// Carried along by the backend, not shown on the card
    #[serde(default)]
    #[allow(dead_code)]
    pub extra_data: Option<Value>,
}

/// Keeps `null` apart from a missing key
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Escaping applied to interpolated values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EscapePolicy {
    /// Interpolate as-is, matching what the web front-end emits
    #[default]
    Verbatim,
    /// Escape `& < > " '`
    Html,
}

impl EscapePolicy {
    pub fn apply<'a>(self, s: &'a str) -> Cow<'a, str> {
        match self {
            EscapePolicy::Verbatim => Cow::Borrowed(s),
            EscapePolicy::Html => html_escape(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CardOptions {
    pub escape: EscapePolicy,
    pub on_malformed: FailurePolicy,
}

#[derive(Debug, Error)]
pub enum CardError {
    #[error("invalid response envelope: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("error envelope has no `error` object")]
    MissingError,
    #[error("error envelope has no `logs` list")]
    MissingLogs,
    #[error("error object has no `{0}` field")]
    MissingField(&'static str),
}

/// Parse a response envelope from JSON text
pub fn parse_envelope(json: &str) -> Result<ResponseEnvelope, CardError> {
    Ok(serde_json::from_str(json)?)
}

/// Render the error card for `response`. Returns an empty string for
/// successful responses.
pub fn render_error_card(
    response: &ResponseEnvelope,
    options: &CardOptions,
) -> Result<String, CardError> {
    if response.is_success() {
        return Ok(String::new());
    }

    let fallback_error = ErrorDetail::default();
    let error = match (&response.error, options.on_malformed) {
        (Some(error), _) => error,
        (None, FailurePolicy::Fail) => return Err(CardError::MissingError),
        (None, FailurePolicy::Ignore) => {
            tracing::warn!("Rendering error card without an error object");
            &fallback_error
        }
    };

    let logs: &[String] = match (&response.logs, options.on_malformed) {
        (Some(logs), _) => logs,
        (None, FailurePolicy::Fail) => return Err(CardError::MissingLogs),
        (None, FailurePolicy::Ignore) => {
            tracing::warn!("Rendering error card without logs");
            &[]
        }
    };

    let field = |name: &'static str, value: &Option<Value>| -> Result<String, CardError> {
        match (value, options.on_malformed) {
            (Some(value), _) => Ok(options.escape.apply(&field_text(value)).into_owned()),
            (None, FailurePolicy::Fail) => Err(CardError::MissingField(name)),
            (None, FailurePolicy::Ignore) => Ok(String::new()),
        }
    };
    let code = field("code", &error.code)?;
    let dev_message = field("dev_message", &error.dev_message)?;
    let user_message = field("user_message", &error.user_message)?;

    let mut html = String::new();
    html.push_str(
        r#"<div class="w3-card-4 w3-margin w3-padding" style="border-color: orangered !important;">"#,
    );
    html.push_str(r#"<h3 class="w3-text-red">Error</h3>"#);
    html.push_str(r#"<p class="w3-text-red">"#);
    html.push_str(&format!("  <b>Code:</b> {}<br>", code));
    html.push_str(&format!("  <b>Dev Message:</b> {}<br>", dev_message));
    html.push_str(&format!("  <b>User Message:</b> {}<br>", user_message));
    html.push_str("</p>");
    html.push_str(&render_logs(logs, options.escape));
    html.push_str("</div>");

    tracing::debug!(lines = logs.len(), bytes = html.len(), "Error card rendered");
    Ok(html)
}

/// Render the preformatted log block, one `<br>`-prefixed line per entry
fn render_logs(logs: &[String], escape: EscapePolicy) -> String {
    let mut out = String::from("<pre style='font-size: 11px'>");
    for line in logs {
        // Classification looks at the raw line, escaping only affects output
        let style = LogStyle::classify(line);
        out.push_str("<br>");
        out.push_str(&style.wrap(&escape.apply(line)));
    }
    out.push_str("</pre>");
    out
}

/// Text of a JSON value as the page's string interpolation shows it:
/// strings as-is, whole numbers without a fraction, arrays joined with
/// commas (nulls inside become empty) and objects as `[object Object]`.
pub fn field_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::Number(n) => Cow::Owned(number_text(n)),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|item| match item {
                    Value::Null => Cow::Borrowed(""),
                    other => field_text(other),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Borrowed("[object Object]"),
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = r#"<div class="w3-card-4 w3-margin w3-padding" style="border-color: orangered !important;"><h3 class="w3-text-red">Error</h3><p class="w3-text-red">"#;

    fn envelope(logs: &[&str]) -> ResponseEnvelope {
        ResponseEnvelope {
            success: Some(Value::Bool(false)),
            error: Some(ErrorDetail {
                code: Some(Value::from(404)),
                dev_message: Some(Value::from("route not found")),
                user_message: Some(Value::from("Page missing")),
                extra_data: None,
            }),
            logs: Some(logs.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_success_renders_nothing() {
        let response = ResponseEnvelope {
            success: Some(Value::Bool(true)),
            ..envelope(&["(err) ignored"])
        };
        assert_eq!(render_error_card(&response, &CardOptions::default()).unwrap(), "");

        let bare = parse_envelope(r#"{"success": true}"#).unwrap();
        assert_eq!(render_error_card(&bare, &CardOptions::default()).unwrap(), "");
    }

    #[test]
    fn test_empty_logs_card() {
        let html = render_error_card(&envelope(&[]), &CardOptions::default()).unwrap();

        let expected = format!(
            "{}  <b>Code:</b> 404<br>  <b>Dev Message:</b> route not found<br>  <b>User Message:</b> Page missing<br></p><pre style='font-size: 11px'></pre></div>",
            HEADER
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_log_lines_styled_in_order() {
        let html = render_error_card(
            &envelope(&["(err) boom", "(warn) careful", "plain line", "&[marker]"]),
            &CardOptions::default(),
        )
        .unwrap();

        let expected_logs = concat!(
            "<pre style='font-size: 11px'>",
            "<br><span style='color: red'>(err) boom</span>",
            "<br><span style='color: #e0bb00'>(warn) careful</span>",
            "<br>plain line",
            "<br><small><b style='color: #0016ff'>&[marker]</b></small>",
            "</pre></div>",
        );
        assert!(html.ends_with(expected_logs), "got: {}", html);
    }

    #[test]
    fn test_log_wraps_untrimmed_line() {
        let html = render_error_card(&envelope(&["  (todo) indented "]), &CardOptions::default())
            .unwrap();
        assert!(html.contains("<br><span style='color: #00a2da'>  (todo) indented </span></pre>"));
    }

    #[test]
    fn test_missing_success_still_renders() {
        let response = parse_envelope(
            r#"{"error": {"code": "E1", "dev_message": "dev", "user_message": "user"}, "logs": []}"#,
        )
        .unwrap();
        let html = render_error_card(&response, &CardOptions::default()).unwrap();
        assert!(html.contains("<b>Code:</b> E1<br>"));
    }

    #[test]
    fn test_verbatim_does_not_escape() {
        let mut response = envelope(&["(err) <script>"]);
        if let Some(error) = response.error.as_mut() {
            error.dev_message = Some(Value::from("a < b"));
        }

        let html = render_error_card(&response, &CardOptions::default()).unwrap();
        assert!(html.contains("<b>Dev Message:</b> a < b<br>"));
        assert!(html.contains("<span style='color: red'>(err) <script></span>"));
    }

    #[test]
    fn test_html_escape_keeps_classification() {
        let mut response = envelope(&["&[section]", "(err) <b>x</b>"]);
        if let Some(error) = response.error.as_mut() {
            error.user_message = Some(Value::from("\"quoted\" & 'single'"));
        }
        let options = CardOptions {
            escape: EscapePolicy::Html,
            ..CardOptions::default()
        };

        let html = render_error_card(&response, &options).unwrap();
        assert!(html.contains("<b>User Message:</b> &quot;quoted&quot; &amp; &#39;single&#39;<br>"));
        assert!(html.contains("<small><b style='color: #0016ff'>&amp;[section]</b></small>"));
        assert!(html.contains("<span style='color: red'>(err) &lt;b&gt;x&lt;/b&gt;</span>"));
    }

    #[test]
    fn test_malformed_envelope_fails_by_default() {
        let no_error = parse_envelope(r#"{"success": false, "logs": []}"#).unwrap();
        assert!(matches!(
            render_error_card(&no_error, &CardOptions::default()),
            Err(CardError::MissingError)
        ));

        let no_logs = parse_envelope(
            r#"{"success": false, "error": {"code": 1, "dev_message": "d", "user_message": "u"}}"#,
        )
        .unwrap();
        assert!(matches!(
            render_error_card(&no_logs, &CardOptions::default()),
            Err(CardError::MissingLogs)
        ));
    }

    #[test]
    fn test_malformed_envelope_ignored() {
        let options = CardOptions {
            on_malformed: FailurePolicy::Ignore,
            ..CardOptions::default()
        };
        let bare = parse_envelope(r#"{"success": false}"#).unwrap();

        let html = render_error_card(&bare, &options).unwrap();
        let expected = format!(
            "{}  <b>Code:</b> <br>  <b>Dev Message:</b> <br>  <b>User Message:</b> <br></p><pre style='font-size: 11px'></pre></div>",
            HEADER
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_field_text_formats_values() {
        assert_eq!(field_text(&Value::from("text")), "text");
        assert_eq!(field_text(&Value::from(12)), "12");
        assert_eq!(field_text(&Value::Null), "null");
        assert_eq!(field_text(&Value::from(false)), "false");
        assert_eq!(field_text(&Value::from(1.0)), "1");
        assert_eq!(field_text(&Value::from(1.5)), "1.5");
        assert_eq!(field_text(&Value::from(-3)), "-3");
        assert_eq!(field_text(&serde_json::json!({"a": 1})), "[object Object]");
        assert_eq!(field_text(&serde_json::json!(["a", null, 2])), "a,,2");
        assert_eq!(field_text(&serde_json::json!([])), "");
    }

    #[test]
    fn test_missing_field_fails_by_default() {
        let response = parse_envelope(
            r#"{"success": false, "error": {"dev_message": "d", "user_message": "u"}, "logs": []}"#,
        )
        .unwrap();
        assert!(matches!(
            render_error_card(&response, &CardOptions::default()),
            Err(CardError::MissingField("code"))
        ));
    }

    #[test]
    fn test_missing_field_ignored_renders_blank() {
        let response = parse_envelope(
            r#"{"success": false, "error": {"dev_message": "d", "user_message": "u"}, "logs": []}"#,
        )
        .unwrap();
        let options = CardOptions {
            on_malformed: FailurePolicy::Ignore,
            ..CardOptions::default()
        };

        let html = render_error_card(&response, &options).unwrap();
        assert!(html.contains("<b>Code:</b> <br>  <b>Dev Message:</b> d<br>"));
    }

    #[test]
    fn test_explicit_null_field_renders_null() {
        let response = parse_envelope(
            r#"{"success": false, "error": {"code": null, "dev_message": "d", "user_message": "u"}, "logs": []}"#,
        )
        .unwrap();
        let html = render_error_card(&response, &CardOptions::default()).unwrap();
        assert!(html.contains("<b>Code:</b> null<br>"));
    }

    #[test]
    fn test_only_literal_true_suppresses_card() {
        for success in ["null", "1", "\"true\"", "{}"] {
            let json = format!(
                r#"{{"success": {}, "error": {{"code": 1, "dev_message": "d", "user_message": "u"}}, "logs": []}}"#,
                success
            );
            let response = parse_envelope(&json).unwrap();
            assert!(!response.is_success());
            let html = render_error_card(&response, &CardOptions::default()).unwrap();
            assert!(html.contains("<b>Code:</b> 1<br>"), "success = {}", success);
        }
    }

    #[test]
    fn test_envelope_keeps_extra_data() {
        let response = parse_envelope(
            r#"{"success": false, "error": {"code": 3, "dev_message": "d", "user_message": "u", "extra_data": {"field": "name"}}, "logs": ["x"]}"#,
        )
        .unwrap();
        let extra = response.error.and_then(|e| e.extra_data).unwrap();
        assert_eq!(extra["field"], "name");
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(parse_envelope("{not json"), Err(CardError::Parse(_))));
    }
}
