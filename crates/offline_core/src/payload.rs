//! The stdout payload protocol shared with the mock runtime.
//!
//! A child invocation writes free-form diagnostics interleaved with at most
//! one single-line JSON record keyed by [`PAYLOAD_MARKER`]. Everything that
//! is not the marker line is forwarded to the developer verbatim.

use serde_json::Value;

use crate::contract::ResultPayload;

/// Substring identifying the one machine-readable line of child output.
pub const PAYLOAD_MARKER: &str = "offline_payload";

/// Child stdout split into its two halves: the structured payload (if the
/// marker ever appeared and parsed) and the diagnostic lines in their
/// original order.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput {
    pub payload: Option<ResultPayload>,
    pub diagnostic_lines: Vec<String>,
}

impl SplitOutput {
    /// The diagnostic lines rejoined for a single log-sink write.
    pub fn diagnostics_block(&self) -> String {
        self.diagnostic_lines.join("\n")
    }
}

/// Scan child stdout line by line, separating diagnostics from the marker
/// record.
///
/// Marker lines that do not parse (invalid JSON, marker value not an object,
/// neither `success` nor `error` present) are dropped entirely: they are not
/// diagnostics and they record no payload. A `success` field selects the
/// success arm by presence, not truthiness, so `false`, `0`, `""`, and
/// `null` are valid success values; `error` is only consulted when `success`
/// is absent. When several marker lines appear, the last parseable one wins.
pub fn split_result_payload(stdout: &str) -> SplitOutput {
    let mut payload = None;
    let mut diagnostic_lines = Vec::new();

    for line in stdout.split('\n') {
        if !line.contains(PAYLOAD_MARKER) {
            diagnostic_lines.push(line.to_string());
            continue;
        }

        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        let Some(record) = value.get(PAYLOAD_MARKER).and_then(Value::as_object) else {
            continue;
        };

        if let Some(success) = record.get("success") {
            payload = Some(ResultPayload::Success(success.clone()));
        } else if let Some(error) = record.get("error") {
            payload = Some(ResultPayload::Error(error.clone()));
        }
    }

    SplitOutput {
        payload,
        diagnostic_lines,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn splits_marker_payload_from_diagnostics() {
        let stdout = "log A\n{\"offline_payload\":{\"success\":{\"x\":1}}}\nlog B";

        let split = split_result_payload(stdout);
        assert_eq!(
            split.payload,
            Some(ResultPayload::Success(json!({"x": 1})))
        );
        assert_eq!(split.diagnostics_block(), "log A\nlog B");
    }

    #[test]
    fn error_field_becomes_the_payload() {
        let stdout = "{\"offline_payload\":{\"error\":{\"message\":\"denied\"}}}";

        let split = split_result_payload(stdout);
        assert_eq!(
            split.payload,
            Some(ResultPayload::Error(json!({"message": "denied"})))
        );
        assert!(split.diagnostic_lines.is_empty());
    }

    #[test]
    fn missing_marker_yields_no_payload_and_full_diagnostics() {
        let stdout = "starting\nworking\ndone";

        let split = split_result_payload(stdout);
        assert_eq!(split.payload, None);
        assert_eq!(split.diagnostic_lines, vec!["starting", "working", "done"]);
    }

    #[test]
    fn malformed_marker_line_is_dropped_silently() {
        let stdout = "before\n{\"offline_payload\": not json\nafter";

        let split = split_result_payload(stdout);
        assert_eq!(split.payload, None);
        assert_eq!(split.diagnostic_lines, vec!["before", "after"]);
    }

    #[test]
    fn marker_record_without_either_field_records_nothing() {
        let stdout = "{\"offline_payload\":{\"status\":\"ok\"}}";

        let split = split_result_payload(stdout);
        assert_eq!(split.payload, None);
        assert!(split.diagnostic_lines.is_empty());
    }

    #[test]
    fn last_marker_line_wins() {
        let stdout = concat!(
            "{\"offline_payload\":{\"success\":{\"attempt\":1}}}\n",
            "retrying\n",
            "{\"offline_payload\":{\"success\":{\"attempt\":2}}}",
        );

        let split = split_result_payload(stdout);
        assert_eq!(
            split.payload,
            Some(ResultPayload::Success(json!({"attempt": 2})))
        );
        assert_eq!(split.diagnostic_lines, vec!["retrying"]);
    }

    #[test]
    fn falsy_but_present_success_is_still_success() {
        let stdout = "{\"offline_payload\":{\"success\":false,\"error\":{\"code\":1}}}";

        let split = split_result_payload(stdout);
        assert_eq!(split.payload, Some(ResultPayload::Success(json!(false))));
    }

    #[test]
    fn empty_lines_are_preserved_in_order() {
        let stdout = "a\n\nb";

        let split = split_result_payload(stdout);
        assert_eq!(split.diagnostics_block(), "a\n\nb");
    }
}
