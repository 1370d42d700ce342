//! Child environment composition.
//!
//! The child process sees three layers merged in increasing precedence: the
//! host-provided base environment, the toolchain's own reported environment,
//! and the explicit platform overrides (credentials, invocation context,
//! serialized event, authorizer flags).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::contract::{stable_contract_json, InvocationContext, SessionCredentials};

/// Derived access-control signals computed from the event's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizerFlags {
    pub is_authorizer: bool,
    pub is_request_authorizer: bool,
    pub is_token_authorizer: bool,
}

pub fn authorizer_flags(event: &Value) -> AuthorizerFlags {
    let event_type = event.get("type").and_then(Value::as_str);
    let is_request_authorizer = event_type == Some("REQUEST");
    let is_token_authorizer = event_type == Some("TOKEN");

    AuthorizerFlags {
        is_authorizer: is_request_authorizer || is_token_authorizer,
        is_request_authorizer,
        is_token_authorizer,
    }
}

/// Parse toolchain-reported environment output, one `KEY="VALUE"` per line.
///
/// Lines without the `="` delimiter are skipped; trailing carriage returns
/// are tolerated so Windows toolchains parse the same way.
pub fn parse_toolchain_env(output: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for line in output.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some((key, rest)) = line.split_once("=\"") else {
            continue;
        };
        let value = rest.strip_suffix('"').unwrap_or(rest);
        vars.insert(key.to_string(), value.to_string());
    }

    vars
}

/// Build the full environment for one child invocation.
pub fn compose_child_env(
    base_env: &BTreeMap<String, String>,
    toolchain_env: &BTreeMap<String, String>,
    credentials: &SessionCredentials,
    profile: &str,
    context: &InvocationContext,
    event: &Value,
    inherited_path: Option<&str>,
) -> BTreeMap<String, String> {
    let mut env = base_env.clone();
    env.extend(
        toolchain_env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    let flags = authorizer_flags(event);

    env.insert(
        "AWS_ACCESS_KEY_ID".to_string(),
        credentials.access_key_id.clone(),
    );
    env.insert(
        "AWS_SECRET_ACCESS_KEY".to_string(),
        credentials.secret_access_key.clone(),
    );
    env.insert(
        "AWS_SESSION_TOKEN".to_string(),
        credentials.session_token.clone(),
    );
    env.insert("AWS_PROFILE".to_string(), profile.to_string());
    env.insert(
        "AWS_LAMBDA_LOG_GROUP_NAME".to_string(),
        context.log_group_name.clone(),
    );
    env.insert(
        "AWS_LAMBDA_LOG_STREAM_NAME".to_string(),
        context.log_stream_name.clone(),
    );
    env.insert(
        "AWS_LAMBDA_FUNCTION_NAME".to_string(),
        context.function_name.clone(),
    );
    env.insert(
        "AWS_LAMBDA_FUNCTION_MEMORY_SIZE".to_string(),
        context.memory_limit_in_mb.to_string(),
    );
    env.insert(
        "AWS_LAMBDA_FUNCTION_VERSION".to_string(),
        context.function_version.clone(),
    );
    env.insert("LAMBDA_EVENT".to_string(), stable_contract_json(event));
    env.insert("LAMBDA_CONTEXT".to_string(), stable_contract_json(context));
    env.insert(
        "IS_LAMBDA_AUTHORIZER".to_string(),
        flags.is_authorizer.to_string(),
    );
    env.insert(
        "IS_LAMBDA_REQUEST_AUTHORIZER".to_string(),
        flags.is_request_authorizer.to_string(),
    );
    env.insert(
        "IS_LAMBDA_TOKEN_AUTHORIZER".to_string(),
        flags.is_token_authorizer.to_string(),
    );
    if let Some(path) = inherited_path {
        env.insert("PATH".to_string(), path.to_string());
    }

    env
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_context() -> InvocationContext {
        InvocationContext {
            log_group_name: "/aws/lambda/hello".to_string(),
            log_stream_name: "2026/08/07/[$LATEST]abc".to_string(),
            function_name: "hello".to_string(),
            memory_limit_in_mb: 256,
            function_version: "$LATEST".to_string(),
        }
    }

    fn test_credentials() -> SessionCredentials {
        SessionCredentials {
            access_key_id: "AKIA_TEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
        }
    }

    #[test]
    fn token_event_sets_token_and_authorizer_flags() {
        let flags = authorizer_flags(&json!({"type": "TOKEN"}));
        assert!(flags.is_authorizer);
        assert!(!flags.is_request_authorizer);
        assert!(flags.is_token_authorizer);
    }

    #[test]
    fn request_event_sets_request_and_authorizer_flags() {
        let flags = authorizer_flags(&json!({"type": "REQUEST"}));
        assert!(flags.is_authorizer);
        assert!(flags.is_request_authorizer);
        assert!(!flags.is_token_authorizer);
    }

    #[test]
    fn other_event_types_clear_all_flags() {
        for event in [json!({"type": "SCHEDULED"}), json!({}), json!({"type": 3})] {
            let flags = authorizer_flags(&event);
            assert!(!flags.is_authorizer);
            assert!(!flags.is_request_authorizer);
            assert!(!flags.is_token_authorizer);
        }
    }

    #[test]
    fn parses_quoted_key_value_lines() {
        let output = "GOPATH=\"/home/dev/go\"\nGOOS=\"linux\"\nGOFLAGS=\"\"\nnot a var\n";

        let vars = parse_toolchain_env(output);
        assert_eq!(vars.get("GOPATH").map(String::as_str), Some("/home/dev/go"));
        assert_eq!(vars.get("GOOS").map(String::as_str), Some("linux"));
        assert_eq!(vars.get("GOFLAGS").map(String::as_str), Some(""));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn tolerates_carriage_returns() {
        let vars = parse_toolchain_env("GOOS=\"windows\"\r\nGOARCH=\"amd64\"\r\n");
        assert_eq!(vars.get("GOOS").map(String::as_str), Some("windows"));
        assert_eq!(vars.get("GOARCH").map(String::as_str), Some("amd64"));
    }

    #[test]
    fn overrides_take_precedence_over_base_and_toolchain_env() {
        let base_env = BTreeMap::from([
            ("AWS_PROFILE".to_string(), "stale".to_string()),
            ("EDITOR".to_string(), "vim".to_string()),
            ("GOOS".to_string(), "darwin".to_string()),
        ]);
        let toolchain_env = BTreeMap::from([("GOOS".to_string(), "linux".to_string())]);

        let env = compose_child_env(
            &base_env,
            &toolchain_env,
            &test_credentials(),
            "staging",
            &test_context(),
            &json!({"type": "TOKEN"}),
            Some("/usr/bin:/bin"),
        );

        // base survives where nothing shadows it
        assert_eq!(env.get("EDITOR").map(String::as_str), Some("vim"));
        // toolchain env wins over base
        assert_eq!(env.get("GOOS").map(String::as_str), Some("linux"));
        // explicit overrides win over both
        assert_eq!(env.get("AWS_PROFILE").map(String::as_str), Some("staging"));
        assert_eq!(env.get("PATH").map(String::as_str), Some("/usr/bin:/bin"));
    }

    #[test]
    fn exposes_the_full_platform_variable_set() {
        let env = compose_child_env(
            &BTreeMap::new(),
            &BTreeMap::new(),
            &test_credentials(),
            "default",
            &test_context(),
            &json!({"type": "REQUEST", "methodArn": "arn:aws:execute-api:*"}),
            None,
        );

        assert_eq!(
            env.get("AWS_ACCESS_KEY_ID").map(String::as_str),
            Some("AKIA_TEST")
        );
        assert_eq!(
            env.get("AWS_SECRET_ACCESS_KEY").map(String::as_str),
            Some("secret")
        );
        assert_eq!(
            env.get("AWS_SESSION_TOKEN").map(String::as_str),
            Some("token")
        );
        assert_eq!(
            env.get("AWS_LAMBDA_FUNCTION_NAME").map(String::as_str),
            Some("hello")
        );
        assert_eq!(
            env.get("AWS_LAMBDA_FUNCTION_MEMORY_SIZE").map(String::as_str),
            Some("256")
        );
        assert_eq!(
            env.get("AWS_LAMBDA_FUNCTION_VERSION").map(String::as_str),
            Some("$LATEST")
        );
        assert_eq!(
            env.get("IS_LAMBDA_AUTHORIZER").map(String::as_str),
            Some("true")
        );
        assert_eq!(
            env.get("IS_LAMBDA_REQUEST_AUTHORIZER").map(String::as_str),
            Some("true")
        );
        assert_eq!(
            env.get("IS_LAMBDA_TOKEN_AUTHORIZER").map(String::as_str),
            Some("false")
        );
        assert!(!env.contains_key("PATH"));

        let event: Value = serde_json::from_str(env.get("LAMBDA_EVENT").expect("event blob"))
            .expect("event blob should parse");
        assert_eq!(event["methodArn"], "arn:aws:execute-api:*");

        let context: Value = serde_json::from_str(env.get("LAMBDA_CONTEXT").expect("context blob"))
            .expect("context blob should parse");
        assert_eq!(context["memoryLimitInMB"], 256);
    }
}
