use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event payloads are passed through opaquely; only the `type` tag is ever
/// inspected (see [`crate::environment::authorizer_flags`]).
pub type InvocationEvent = Value;

/// Identity and metadata for one simulated execution, serialized into the
/// child environment under the wire names the platform uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub log_group_name: String,
    pub log_stream_name: String,
    pub function_name: String,
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: u32,
    pub function_version: String,
}

/// Short-term session credentials. Held in memory only; expiry bookkeeping
/// lives with the cache that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

/// The structured result extracted from a child invocation. The two arms are
/// mutually exclusive on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPayload {
    Success(Value),
    Error(Value),
}

impl ResultPayload {
    pub fn is_error(&self) -> bool {
        matches!(self, ResultPayload::Error(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            ResultPayload::Success(value) | ResultPayload::Error(value) => value,
        }
    }
}

/// Stable JSON for values that serialize into the child environment.
pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}
