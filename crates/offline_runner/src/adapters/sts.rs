//! STS-backed credential source.

use offline_core::contract::SessionCredentials;

use crate::credentials::CredentialSource;

/// Acquires session tokens through the AWS SDK for the named profile.
///
/// The SDK is async while the credential seam is sync, so calls block in
/// place on the ambient runtime; this requires the multi-threaded tokio
/// runtime the harness binaries run under.
#[derive(Debug, Default, Clone, Copy)]
pub struct StsCredentialSource;

impl CredentialSource for StsCredentialSource {
    fn acquire_session(
        &self,
        profile: &str,
        duration_secs: i32,
    ) -> Result<SessionCredentials, String> {
        let profile = profile.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .profile_name(&profile)
                    .load()
                    .await;
                let client = aws_sdk_sts::Client::new(&config);

                let response = client
                    .get_session_token()
                    .duration_seconds(duration_secs)
                    .send()
                    .await
                    .map_err(|error| format!("failed to acquire session token: {error}"))?;

                let credentials = response
                    .credentials()
                    .ok_or_else(|| "session token response carried no credentials".to_string())?;

                Ok(SessionCredentials {
                    access_key_id: credentials.access_key_id().to_string(),
                    secret_access_key: credentials.secret_access_key().to_string(),
                    session_token: credentials.session_token().to_string(),
                })
            })
        })
    }
}
