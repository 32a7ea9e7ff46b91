//! Log attribute construction for request and response bodies.
//!
//! A captured body is truncated to a byte limit, masked, and shaped
//! into either a structured group attribute (decoded object fields) or
//! a plain text attribute, so the log call site never has to care
//! whether the payload was valid JSON.

use serde_json::{Map, Value};

use crate::json::{mask_json, MaskedJson};

/// A body rendered for logging.
#[derive(Debug)]
pub enum BodyAttr {
    /// Masked body as one text attribute. Used for non-object payloads,
    /// partially decoded payloads, and when the caller prefers text.
    Text { key: String, value: String },
    /// Masked body decoded into its top-level object fields.
    Group {
        key: String,
        fields: Map<String, Value>,
    },
}

impl BodyAttr {
    /// Attribute key this body will be logged under.
    pub fn key(&self) -> &str {
        match self {
            BodyAttr::Text { key, .. } => key,
            BodyAttr::Group { key, .. } => key,
        }
    }
}

/// Builds the log attribute for `body`, masking with the process-wide
/// converter.
///
/// The body is truncated to `limit` bytes before masking, so a
/// truncated document decodes as far as it goes and the partial masked
/// text is still logged. A complete top-level object becomes a
/// [`BodyAttr::Group`] under `key` unless `prefer_text` is set;
/// everything else becomes a [`BodyAttr::Text`] under `{key}_text`.
/// A body that produced no output at all (empty or not JSON from the
/// first byte) is logged lossily as the original text.
pub fn build_attr(key: &str, body: &[u8], limit: usize, prefer_text: bool) -> BodyAttr {
    let truncated = &body[..limit.min(body.len())];
    let MaskedJson { text, error } = mask_json(truncated);

    let text = if text.is_empty() {
        String::from_utf8_lossy(truncated).into_owned()
    } else {
        text
    };

    if error.is_none() && !prefer_text {
        if let Ok(fields) = serde_json::from_str::<Map<String, Value>>(&text) {
            return BodyAttr::Group {
                key: key.to_string(),
                fields,
            };
        }
    }
    BodyAttr::Text {
        key: format!("{key}_text"),
        value: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redactor::{clear_active_converter, set_active_converter, test_guard};
    use crate::rule::{Converter, Rule};

    const EMPLOYEE_BODY: &str = "{\n \"username\": \"employee\",\n \"email\": \"employer@now.com\",\n \
                                 \"id\": 2,\n \"age\": null,\n \"cvc\": 123,\n \
                                 \"password\": \"awesome\",\n \"bio\": {\"lastname\": \"Last\"}\n}";

    fn install() {
        let converter = Converter::new(vec![
            Rule::mask_name(["lastname"]),
            Rule::mask_email(["email"]),
            Rule::full_exclusion(["password"]),
        ])
        .unwrap();
        set_active_converter(converter);
    }

    #[test]
    fn object_body_becomes_group() {
        let _guard = test_guard();
        clear_active_converter();

        let attr = build_attr("body", br#"{"id":7,"name":"x"}"#, 1024, false);
        match attr {
            BodyAttr::Group { key, fields } => {
                assert_eq!(key, "body");
                assert_eq!(fields.get("id"), Some(&Value::from(7)));
                assert_eq!(fields.get("name"), Some(&Value::from("x")));
            }
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn group_fields_are_masked() {
        let _guard = test_guard();
        install();

        let attr = build_attr("response", EMPLOYEE_BODY.as_bytes(), 4096, false);
        match attr {
            BodyAttr::Group { key, fields } => {
                assert_eq!(key, "response");
                assert_eq!(fields.get("password"), Some(&Value::from("*******")));
                assert_eq!(fields.get("email"), Some(&Value::from("emp*****@now.com")));
                assert_eq!(fields.get("id"), Some(&Value::from(2)));
            }
            other => panic!("expected group, got {other:?}"),
        }
        clear_active_converter();
    }

    #[test]
    fn prefer_text_forces_text_attribute() {
        let _guard = test_guard();
        clear_active_converter();

        let attr = build_attr("body", br#"{"a":"b"}"#, 1024, true);
        match attr {
            BodyAttr::Text { key, value } => {
                assert_eq!(key, "body_text");
                assert_eq!(value, r#"{"a":"b"}"#);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn non_object_json_stays_text() {
        let _guard = test_guard();
        clear_active_converter();

        let attr = build_attr("body", b"[1,2,3]", 1024, false);
        match attr {
            BodyAttr::Text { key, value } => {
                assert_eq!(key, "body_text");
                assert_eq!(value, "[1,2,3]");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn truncated_body_keeps_masked_prefix() {
        let _guard = test_guard();
        install();

        let attr = build_attr("request", EMPLOYEE_BODY.as_bytes(), 100, false);
        match attr {
            BodyAttr::Text { key, value } => {
                assert_eq!(key, "request_text");
                assert_eq!(
                    value,
                    r#"{"username":"employee","email":"emp*****@now.com","id":2,"age":null,"cvc":123"#
                );
            }
            other => panic!("expected text, got {other:?}"),
        }
        clear_active_converter();
    }

    #[test]
    fn binary_body_falls_back_to_lossy_text() {
        let _guard = test_guard();
        clear_active_converter();

        let attr = build_attr("body", b"\xff\xfeplain", 1024, false);
        match attr {
            BodyAttr::Text { key, value } => {
                assert_eq!(key, "body_text");
                assert_eq!(value, "\u{FFFD}\u{FFFD}plain");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn zero_limit_logs_empty_text() {
        let _guard = test_guard();
        clear_active_converter();

        let attr = build_attr("body", b"{\"a\":1}", 0, false);
        match attr {
            BodyAttr::Text { key, value } => {
                assert_eq!(key, "body_text");
                assert_eq!(value, "");
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn key_accessor_covers_both_shapes() {
        let text = BodyAttr::Text {
            key: "a".into(),
            value: String::new(),
        };
        let group = BodyAttr::Group {
            key: "b".into(),
            fields: Map::new(),
        };
        assert_eq!(text.key(), "a");
        assert_eq!(group.key(), "b");
    }
}
