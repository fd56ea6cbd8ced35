//! OAuth1 provider client
//!
//! [`OAuth1Client`] is the seam the handshake adapter talks through.
//! [`HttpOAuth1Client`] is the reqwest-backed implementation that signs each
//! request per RFC 5849 and parses the provider's form-encoded responses.

use crate::models::{ProviderProfile, TemporaryCredentials, TokenCredentials};
use crate::oauth1::profile::ProfileFieldMap;
use crate::oauth1::signature::{OAuthSigner, SignatureMethod};
use crate::oauth1::OAuth1Error;
use crate::utils::logging::LoggingHelper;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use std::collections::HashMap;
use url::Url;

/// Operations a provider must support for the three-legged handshake
#[async_trait]
pub trait OAuth1Client: Send + Sync {
    /// Provider name used in logs
    fn provider_name(&self) -> &str {
        "oauth1"
    }

    /// Obtain temporary credentials bound to `callback_uri`
    async fn temporary_credentials(
        &self,
        callback_uri: &str,
    ) -> Result<TemporaryCredentials, OAuth1Error>;

    /// URL the user agent is sent to for authorization
    fn authorization_url(&self, temporary: &TemporaryCredentials) -> Result<String, OAuth1Error>;

    /// Exchange temporary credentials plus the callback token and verifier for token credentials
    async fn token_credentials(
        &self,
        temporary: &TemporaryCredentials,
        oauth_token: &str,
        verifier: &str,
    ) -> Result<TokenCredentials, OAuth1Error>;

    /// Fetch the authenticated user's details
    async fn user_details(&self, token: &TokenCredentials) -> Result<ProviderProfile, OAuth1Error>;
}

/// Consumer key and secret registered with the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub identifier: String,
    pub secret: String,
}

/// Provider endpoints used during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoints {
    pub temporary_credentials_url: String,
    pub authorization_url: String,
    pub token_credentials_url: String,
    pub user_details_url: String,
}

/// reqwest-backed OAuth1 client for a single provider
#[derive(Debug, Clone)]
pub struct HttpOAuth1Client {
    name: String,
    credentials: ClientCredentials,
    endpoints: ServerEndpoints,
    signature_method: SignatureMethod,
    profile_fields: ProfileFieldMap,
    http_client: reqwest::Client,
}

impl HttpOAuth1Client {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns an error if the consumer credentials are empty or an endpoint is not a valid URL
    pub fn new(
        name: impl Into<String>,
        credentials: ClientCredentials,
        endpoints: ServerEndpoints,
    ) -> Result<Self, OAuth1Error> {
        if credentials.identifier.is_empty() || credentials.secret.is_empty() {
            return Err(OAuth1Error::Configuration(
                "Client identifier and secret are required".to_string(),
            ));
        }

        for (label, url) in [
            ("temporary credentials", &endpoints.temporary_credentials_url),
            ("authorization", &endpoints.authorization_url),
            ("token credentials", &endpoints.token_credentials_url),
            ("user details", &endpoints.user_details_url),
        ] {
            Url::parse(url).map_err(|e| {
                OAuth1Error::Configuration(format!("Invalid {label} URL '{url}': {e}"))
            })?;
        }

        Ok(Self {
            name: name.into(),
            credentials,
            endpoints,
            signature_method: SignatureMethod::default(),
            profile_fields: ProfileFieldMap::default(),
            http_client: reqwest::Client::new(),
        })
    }

    #[must_use]
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }

    #[must_use]
    pub fn with_profile_fields(mut self, fields: ProfileFieldMap) -> Self {
        self.profile_fields = fields;
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    fn signer(&self) -> OAuthSigner<'_> {
        OAuthSigner::new(
            &self.credentials.identifier,
            &self.credentials.secret,
            self.signature_method,
        )
    }

    /// POST a signed request and return the body of a successful response
    ///
    /// `form` must be the same body parameters the signature covered.
    async fn post_signed(
        &self,
        endpoint: &str,
        url: &str,
        authorization: String,
        form: &[(&str, &str)],
    ) -> Result<String, OAuth1Error> {
        let mut request = self.http_client.post(url).header(AUTHORIZATION, authorization);
        if !form.is_empty() {
            request = request.form(form);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        LoggingHelper::log_provider_response(endpoint, status.as_u16(), body.len());

        if !status.is_success() {
            return Err(OAuth1Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl OAuth1Client for HttpOAuth1Client {
    fn provider_name(&self) -> &str {
        &self.name
    }

    async fn temporary_credentials(
        &self,
        callback_uri: &str,
    ) -> Result<TemporaryCredentials, OAuth1Error> {
        let url = &self.endpoints.temporary_credentials_url;
        let authorization =
            self.signer()
                .authorization_header("POST", url, &[("oauth_callback", callback_uri)], &[])?;

        let body = self
            .post_signed("temporary credentials endpoint", url, authorization, &[])
            .await?;
        parse_temporary_credentials(&body)
    }

    fn authorization_url(&self, temporary: &TemporaryCredentials) -> Result<String, OAuth1Error> {
        build_authorization_url(&self.endpoints.authorization_url, temporary)
    }

    async fn token_credentials(
        &self,
        temporary: &TemporaryCredentials,
        oauth_token: &str,
        verifier: &str,
    ) -> Result<TokenCredentials, OAuth1Error> {
        if oauth_token != temporary.identifier {
            return Err(OAuth1Error::TokenMismatch);
        }

        let url = &self.endpoints.token_credentials_url;
        let form = [("oauth_verifier", verifier)];
        let authorization = self
            .signer()
            .with_token(&temporary.identifier, &temporary.secret)
            .authorization_header("POST", url, &[], &form)?;

        let body = self
            .post_signed("token credentials endpoint", url, authorization, &form)
            .await?;
        parse_token_credentials(&body)
    }

    async fn user_details(&self, token: &TokenCredentials) -> Result<ProviderProfile, OAuth1Error> {
        let url = &self.endpoints.user_details_url;
        let authorization = self
            .signer()
            .with_token(&token.identifier, &token.secret)
            .authorization_header("GET", url, &[], &[])?;

        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        LoggingHelper::log_provider_response("user details endpoint", status.as_u16(), body.len());

        if !status.is_success() {
            return Err(OAuth1Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            OAuth1Error::InvalidResponse(format!("User details response is not JSON: {e}"))
        })?;
        self.profile_fields.map(payload)
    }
}

/// Decode an `application/x-www-form-urlencoded` provider response
///
/// # Errors
///
/// Returns an error if the provider reported a problem in the body
pub fn parse_form_response(body: &str) -> Result<HashMap<String, String>, OAuth1Error> {
    let fields: HashMap<String, String> = url::form_urlencoded::parse(body.trim().as_bytes())
        .into_owned()
        .collect();

    if let Some(problem) = fields.get("oauth_problem").or_else(|| fields.get("error")) {
        return Err(OAuth1Error::InvalidResponse(format!(
            "Provider reported an error: {problem}"
        )));
    }
    Ok(fields)
}

fn token_pair(fields: &HashMap<String, String>) -> Result<(String, String), OAuth1Error> {
    let identifier = fields
        .get("oauth_token")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OAuth1Error::InvalidResponse("Response is missing oauth_token".to_string()))?;
    let secret = fields.get("oauth_token_secret").ok_or_else(|| {
        OAuth1Error::InvalidResponse("Response is missing oauth_token_secret".to_string())
    })?;
    Ok((identifier.clone(), secret.clone()))
}

/// Parse the temporary credentials response
///
/// # Errors
///
/// Returns an error if the callback was not confirmed or the token pair is missing
pub fn parse_temporary_credentials(body: &str) -> Result<TemporaryCredentials, OAuth1Error> {
    let fields = parse_form_response(body)?;
    if fields.get("oauth_callback_confirmed").map(String::as_str) != Some("true") {
        return Err(OAuth1Error::CallbackNotConfirmed);
    }
    let (identifier, secret) = token_pair(&fields)?;
    Ok(TemporaryCredentials { identifier, secret })
}

/// Parse the token credentials response
///
/// # Errors
///
/// Returns an error if the token pair is missing
pub fn parse_token_credentials(body: &str) -> Result<TokenCredentials, OAuth1Error> {
    let fields = parse_form_response(body)?;
    let (identifier, secret) = token_pair(&fields)?;
    Ok(TokenCredentials { identifier, secret })
}

/// Append `oauth_token` to the provider's authorization endpoint
///
/// # Errors
///
/// Returns an error if the endpoint is not a valid URL
pub fn build_authorization_url(
    endpoint: &str,
    temporary: &TemporaryCredentials,
) -> Result<String, OAuth1Error> {
    let mut url = Url::parse(endpoint).map_err(|e| {
        OAuth1Error::Configuration(format!("Invalid authorization URL '{endpoint}': {e}"))
    })?;
    url.query_pairs_mut()
        .append_pair("oauth_token", &temporary.identifier);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> ServerEndpoints {
        ServerEndpoints {
            temporary_credentials_url: "https://provider.example/oauth/request_token".to_string(),
            authorization_url: "https://provider.example/oauth/authorize".to_string(),
            token_credentials_url: "https://provider.example/oauth/access_token".to_string(),
            user_details_url: "https://provider.example/api/me".to_string(),
        }
    }

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            identifier: "consumer-key".to_string(),
            secret: "consumer-secret".to_string(),
        }
    }

    fn temporary() -> TemporaryCredentials {
        TemporaryCredentials {
            identifier: "temp-id".to_string(),
            secret: "temp-secret".to_string(),
        }
    }

    #[test]
    fn test_parse_temporary_credentials() {
        let creds = parse_temporary_credentials(
            "oauth_token=hh5s93j4hdidpola&oauth_token_secret=hdhd0244k9j7ao03&oauth_callback_confirmed=true",
        )
        .unwrap();
        assert_eq!(creds.identifier, "hh5s93j4hdidpola");
        assert_eq!(creds.secret, "hdhd0244k9j7ao03");
    }

    #[test]
    fn test_unconfirmed_callback_is_rejected() {
        let result = parse_temporary_credentials("oauth_token=a&oauth_token_secret=b");
        assert!(matches!(result, Err(OAuth1Error::CallbackNotConfirmed)));

        let result = parse_temporary_credentials(
            "oauth_token=a&oauth_token_secret=b&oauth_callback_confirmed=false",
        );
        assert!(matches!(result, Err(OAuth1Error::CallbackNotConfirmed)));
    }

    #[test]
    fn test_parse_token_credentials_decodes_values() {
        let creds =
            parse_token_credentials("oauth_token=nnch734d00sl2jdk&oauth_token_secret=pfkkd%2Bhdhd").unwrap();
        assert_eq!(creds.identifier, "nnch734d00sl2jdk");
        assert_eq!(creds.secret, "pfkkd+hdhd");
    }

    #[test]
    fn test_missing_token_fields_are_invalid() {
        assert!(matches!(
            parse_token_credentials("oauth_token_secret=x"),
            Err(OAuth1Error::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_token_credentials("oauth_token=x"),
            Err(OAuth1Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_provider_problem_is_reported() {
        let result = parse_form_response("oauth_problem=token_rejected");
        match result {
            Err(OAuth1Error::InvalidResponse(msg)) => assert!(msg.contains("token_rejected")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_authorization_url_appends_token() {
        let url = build_authorization_url("https://provider.example/oauth/authorize", &temporary())
            .unwrap();
        assert_eq!(url, "https://provider.example/oauth/authorize?oauth_token=temp-id");

        let url = build_authorization_url(
            "https://provider.example/authorize?force_login=true",
            &temporary(),
        )
        .unwrap();
        assert_eq!(
            url,
            "https://provider.example/authorize?force_login=true&oauth_token=temp-id"
        );
    }

    #[test]
    fn test_new_rejects_bad_configuration() {
        let mut bad = endpoints();
        bad.token_credentials_url = "not a url".to_string();
        assert!(matches!(
            HttpOAuth1Client::new("test", credentials(), bad),
            Err(OAuth1Error::Configuration(_))
        ));

        let empty = ClientCredentials {
            identifier: String::new(),
            secret: "s".to_string(),
        };
        assert!(matches!(
            HttpOAuth1Client::new("test", empty, endpoints()),
            Err(OAuth1Error::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_token_mismatch_is_rejected_before_any_request() {
        let client = HttpOAuth1Client::new("test", credentials(), endpoints()).unwrap();
        let result = client
            .token_credentials(&temporary(), "other-id", "verifier")
            .await;
        assert!(matches!(result, Err(OAuth1Error::TokenMismatch)));
    }

    #[test]
    fn test_provider_name_and_authorization_url() {
        let client = HttpOAuth1Client::new("bitbucket", credentials(), endpoints())
            .unwrap()
            .with_signature_method(SignatureMethod::Plaintext);
        assert_eq!(client.provider_name(), "bitbucket");
        assert_eq!(
            client.authorization_url(&temporary()).unwrap(),
            "https://provider.example/oauth/authorize?oauth_token=temp-id"
        );
    }
}
