//! Handler import rewrite.
//!
//! Staged handler copies swap the real platform runtime for a local mock
//! that implements the same entry-point contract and prints the payload
//! marker instead of talking to the platform.

/// The literal import the real handler carries.
pub const RUNTIME_IMPORT: &str = "\"github.com/aws/aws-lambda-go/lambda\"";

/// The replacement import, aliased so call sites compile unchanged.
pub const MOCK_RUNTIME_IMPORT: &str = "lambda \"github.com/icarus-sullivan/mock-lambda\"";

/// Replace the first occurrence of [`RUNTIME_IMPORT`] with
/// [`MOCK_RUNTIME_IMPORT`]. Exact match only: a handler without the literal
/// import string stages unchanged.
pub fn rewrite_runtime_import(source: &str) -> String {
    source.replacen(RUNTIME_IMPORT, MOCK_RUNTIME_IMPORT, 1)
}
