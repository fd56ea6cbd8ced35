//! OAuth 1.0a request signing (RFC 5849)
//!
//! Builds the signature base string from the request method, the normalized
//! base string URI and the normalized request parameters, signs it with
//! HMAC-SHA1 or PLAINTEXT, and renders the `Authorization: OAuth ...` header.

use crate::oauth1::OAuth1Error;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::fmt;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// Protocol version sent with every signed request
pub const OAUTH_VERSION: &str = "1.0";

/// Length of the generated `oauth_nonce`
pub const NONCE_LENGTH: usize = 32;

/// Supported signature methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignatureMethod {
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
}

impl SignatureMethod {
    /// Wire name used for `oauth_signature_method`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
            SignatureMethod::Plaintext => "PLAINTEXT",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFC 3986 percent-encoding: everything but `ALPHA / DIGIT / "-" / "." / "_" / "~"`
#[must_use]
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Random alphanumeric nonce
#[must_use]
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Current Unix timestamp in seconds
#[must_use]
pub fn generate_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Base string URI: lowercase scheme and host, default port dropped, no query or fragment
#[must_use]
pub fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    format!("{}://{host}{port}{}", url.scheme(), url.path())
}

/// Encode every name and value, sort by name then value, and join as `name=value&...`
#[must_use]
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the signature base string for a request
///
/// Query parameters of `url` are decoded and included alongside `params`
/// (form body and protocol parameters).
///
/// # Errors
///
/// Returns an error if the URL cannot be parsed
pub fn signature_base_string(
    http_method: &str,
    url: &str,
    params: &[(&str, &str)],
) -> Result<String, OAuth1Error> {
    let parsed = Url::parse(url)
        .map_err(|e| OAuth1Error::Configuration(format!("Invalid request URL '{url}': {e}")))?;

    let mut all_params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    all_params.extend(params.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())));

    Ok(format!(
        "{}&{}&{}",
        http_method.to_ascii_uppercase(),
        percent_encode(&base_string_uri(&parsed)),
        percent_encode(&normalize_parameters(&all_params))
    ))
}

/// Sign a base string with the consumer secret and optional token secret
///
/// # Errors
///
/// Returns an error if the HMAC cannot be initialised
pub fn sign(
    method: SignatureMethod,
    base_string: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String, OAuth1Error> {
    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    match method {
        SignatureMethod::HmacSha1 => {
            let mut mac = <HmacSha1 as Mac>::new_from_slice(signing_key.as_bytes())
                .map_err(|e| OAuth1Error::Signature(format!("Invalid HMAC key: {e}")))?;
            mac.update(base_string.as_bytes());
            Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
        }
        SignatureMethod::Plaintext => Ok(signing_key),
    }
}

/// Signs requests on behalf of a consumer, optionally with a token pair
#[derive(Debug, Clone, Copy)]
pub struct OAuthSigner<'a> {
    consumer_key: &'a str,
    consumer_secret: &'a str,
    token: Option<(&'a str, &'a str)>,
    method: SignatureMethod,
}

impl<'a> OAuthSigner<'a> {
    #[must_use]
    pub fn new(consumer_key: &'a str, consumer_secret: &'a str, method: SignatureMethod) -> Self {
        Self {
            consumer_key,
            consumer_secret,
            token: None,
            method,
        }
    }

    /// Sign with a token pair (temporary or token credentials)
    #[must_use]
    pub fn with_token(mut self, identifier: &'a str, secret: &'a str) -> Self {
        self.token = Some((identifier, secret));
        self
    }

    /// Build the `Authorization` header value for a request
    ///
    /// `protocol_params` are extra `oauth_*` parameters (such as
    /// `oauth_callback`) that go into both the signature and the header;
    /// `body_params` are form body parameters that are signed but sent in
    /// the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or signing fails
    pub fn authorization_header(
        &self,
        http_method: &str,
        url: &str,
        protocol_params: &[(&str, &str)],
        body_params: &[(&str, &str)],
    ) -> Result<String, OAuth1Error> {
        self.authorization_header_with(
            http_method,
            url,
            protocol_params,
            body_params,
            &generate_nonce(),
            &generate_timestamp(),
        )
    }

    /// Same as [`Self::authorization_header`] with a fixed nonce and timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or signing fails
    pub fn authorization_header_with(
        &self,
        http_method: &str,
        url: &str,
        protocol_params: &[(&str, &str)],
        body_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, OAuth1Error> {
        let mut oauth_params: Vec<(&str, &str)> = vec![
            ("oauth_consumer_key", self.consumer_key),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", self.method.as_str()),
            ("oauth_timestamp", timestamp),
            ("oauth_version", OAUTH_VERSION),
        ];
        if let Some((identifier, _)) = self.token {
            oauth_params.push(("oauth_token", identifier));
        }
        oauth_params.extend_from_slice(protocol_params);

        let mut signed_params = oauth_params.clone();
        signed_params.extend_from_slice(body_params);

        let base_string = signature_base_string(http_method, url, &signed_params)?;
        let token_secret = self.token.map_or("", |(_, secret)| secret);
        let signature = sign(self.method, &base_string, self.consumer_secret, token_secret)?;

        oauth_params.push(("oauth_signature", signature.as_str()));
        oauth_params.sort_unstable();

        let rendered = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {rendered}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("test@example.com"), "test%40example.com");
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("=%3D"), "%3D%253D");
        assert_eq!(percent_encode("http://x/"), "http%3A%2F%2Fx%2F");
    }

    #[test]
    fn test_nonce_length() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(nonce.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_timestamp_is_numeric() {
        assert!(generate_timestamp().parse::<i64>().is_ok());
    }

    #[test]
    fn test_base_string_uri_normalization() {
        let url = Url::parse("HTTP://Example.COM:80/r%20v/X?id=123").unwrap();
        assert_eq!(base_string_uri(&url), "http://example.com/r%20v/X");

        let url = Url::parse("https://www.example.net:8080/?q=1").unwrap();
        assert_eq!(base_string_uri(&url), "https://www.example.net:8080/");
    }

    #[test]
    fn test_signature_base_string_rfc5849_example() {
        let base = signature_base_string(
            "post",
            "http://example.com/request?b5=%3D%253D&a3=a&c%40=&a2=r%20b",
            &[
                ("oauth_consumer_key", "9djdj82h48djs9d2"),
                ("oauth_token", "kkk9d7dh3k39sjv7"),
                ("oauth_signature_method", "HMAC-SHA1"),
                ("oauth_timestamp", "137131201"),
                ("oauth_nonce", "7d8f3e4a"),
                ("c2", ""),
                ("a3", "2 q"),
            ],
        )
        .unwrap();

        assert_eq!(
            base,
            "POST&http%3A%2F%2Fexample.com%2Frequest&a2%3Dr%2520b%26a3%3D2%2520q\
             %26a3%3Da%26b5%3D%253D%25253D%26c%2540%3D%26c2%3D%26oauth_consumer_\
             key%3D9djdj82h48djs9d2%26oauth_nonce%3D7d8f3e4a%26oauth_signature_m\
             ethod%3DHMAC-SHA1%26oauth_timestamp%3D137131201%26oauth_token%3Dkkk\
             9d7dh3k39sjv7"
        );
    }

    #[test]
    fn test_plaintext_signature_is_encoded_key() {
        let signature = sign(SignatureMethod::Plaintext, "ignored", "c s", "t&s").unwrap();
        assert_eq!(signature, "c%20s&t%26s");
    }

    #[test]
    fn test_hmac_signature_deterministic() {
        let a = sign(SignatureMethod::HmacSha1, "base", "consumer", "token").unwrap();
        let b = sign(SignatureMethod::HmacSha1, "base", "consumer", "token").unwrap();
        let c = sign(SignatureMethod::HmacSha1, "base", "consumer", "other").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // 20-byte SHA-1 digest in standard base64
        assert_eq!(a.len(), 28);
    }

    #[test]
    fn test_authorization_header_contains_protocol_params() {
        let header = OAuthSigner::new("key", "secret", SignatureMethod::HmacSha1)
            .authorization_header_with(
                "POST",
                "https://api.example.com/oauth/request_token",
                &[("oauth_callback", "https://app.example.com/cb?tempId=abc")],
                &[],
                "nonce123",
                "1700000000",
            )
            .unwrap();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_callback=\"https%3A%2F%2Fapp.example.com%2Fcb%3FtempId%3Dabc\""));
        assert!(header.contains("oauth_consumer_key=\"key\""));
        assert!(header.contains("oauth_nonce=\"nonce123\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_timestamp=\"1700000000\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(!header.contains("oauth_token="));
    }

    #[test]
    fn test_authorization_header_with_token_excludes_body_params() {
        let header = OAuthSigner::new("key", "secret", SignatureMethod::Plaintext)
            .with_token("temp-id", "temp-secret")
            .authorization_header_with(
                "POST",
                "https://api.example.com/oauth/access_token",
                &[],
                &[("oauth_verifier", "verifier")],
                "n",
                "1",
            )
            .unwrap();

        assert!(header.contains("oauth_token=\"temp-id\""));
        assert!(header.contains("oauth_signature=\"secret%26temp-secret\""));
        assert!(!header.contains("oauth_verifier"));
    }

    #[test]
    fn test_signature_method_serde_names() {
        let method: SignatureMethod = serde_json::from_str("\"PLAINTEXT\"").unwrap();
        assert_eq!(method, SignatureMethod::Plaintext);
        assert_eq!(
            serde_json::to_string(&SignatureMethod::HmacSha1).unwrap(),
            "\"HMAC-SHA1\""
        );
    }
}
