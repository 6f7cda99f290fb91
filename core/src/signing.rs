//! Request authentication for the AWS-hosted collaborators.
//!
//! A configured bearer token wins. Otherwise requests are signed with SigV4
//! from the environment credentials. With neither, requests go out unsigned,
//! which only suits local endpoint overrides.

use std::time::SystemTime;

use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};

use crate::error::ServiceError;

/// Signs requests for one AWS service in one region.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    signing_name: &'static str,
    payload_checksum: bool,
}

impl SigV4Signer {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        signing_name: &'static str,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            signing_name,
            payload_checksum: false,
        }
    }

    /// Also sends `x-amz-content-sha256`, which S3 requires.
    pub fn with_payload_checksum(mut self) -> Self {
        self.payload_checksum = true;
        self
    }

    /// Adds `authorization`, `x-amz-date` (and the session token, if any) to
    /// `request`. Every header already on the request is signed.
    pub fn sign(
        &self,
        service: &'static str,
        request: &mut reqwest::Request,
    ) -> Result<(), ServiceError> {
        let headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = request.body().and_then(|body| body.as_bytes()).unwrap_or_default();

        let signable = SignableRequest::new(
            request.method().as_str(),
            request.url().as_str(),
            headers.iter().map(|(name, value)| (name.as_str(), value.as_str())),
            SignableBody::Bytes(body),
        )
        .map_err(|e| ServiceError::signing(service, e))?;

        let mut settings = SigningSettings::default();
        if self.payload_checksum {
            settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
        }

        let identity = self.credentials.clone().into();
        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(self.signing_name)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|e| ServiceError::signing(service, e))?
            .into();

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| ServiceError::signing(service, e))?
            .into_parts();

        for (name, value) in instructions.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ServiceError::signing(service, e))?;
            let mut value =
                HeaderValue::from_str(value).map_err(|e| ServiceError::signing(service, e))?;
            value.set_sensitive(true);
            request.headers_mut().insert(name, value);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum RequestAuth {
    Anonymous,
    Bearer(String),
    SigV4(SigV4Signer),
}

impl RequestAuth {
    /// Bearer first, then SigV4, then nothing.
    pub fn resolve(
        bearer_token: Option<String>,
        credentials: Option<Credentials>,
        region: &str,
        signing_name: &'static str,
    ) -> Self {
        match (bearer_token, credentials) {
            (Some(token), _) => RequestAuth::Bearer(token),
            (None, Some(credentials)) => {
                RequestAuth::SigV4(SigV4Signer::new(credentials, region, signing_name))
            }
            (None, None) => RequestAuth::Anonymous,
        }
    }

    pub fn authorize(
        &self,
        service: &'static str,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Request, ServiceError> {
        match self {
            RequestAuth::Anonymous => {}
            RequestAuth::Bearer(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| ServiceError::signing(service, e))?;
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            RequestAuth::SigV4(signer) => signer.sign(service, &mut request)?,
        }
        Ok(request)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RequestAuth::Anonymous => "unsigned",
            RequestAuth::Bearer(_) => "bearer token",
            RequestAuth::SigV4(_) => "SigV4",
        }
    }
}
