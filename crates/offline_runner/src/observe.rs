use serde_json::json;

pub(crate) fn log_runner_info(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "handler_runner",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

pub(crate) fn log_runner_warn(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "handler_runner",
            "level": "warn",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}

pub(crate) fn log_runner_error(event: &str, details: serde_json::Value) {
    eprintln!(
        "{}",
        json!({
            "component": "handler_runner",
            "level": "error",
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
