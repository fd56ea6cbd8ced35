//! Mapping of provider user-details payloads onto [`ProviderProfile`]

use crate::models::ProviderProfile;
use crate::oauth1::OAuth1Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON keys used to read profile fields from the user-details response
///
/// Keys may be dot paths (`"data.attributes.email"`) for nested payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFieldMap {
    #[serde(default = "default_uid")]
    pub uid: String,
    #[serde(default = "default_nickname")]
    pub nickname: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_image_url")]
    pub image_url: String,
}

fn default_uid() -> String {
    "uid".to_string()
}
fn default_nickname() -> String {
    "nickname".to_string()
}
fn default_name() -> String {
    "name".to_string()
}
fn default_email() -> String {
    "email".to_string()
}
fn default_image_url() -> String {
    "imageUrl".to_string()
}

impl Default for ProfileFieldMap {
    fn default() -> Self {
        Self {
            uid: default_uid(),
            nickname: default_nickname(),
            name: default_name(),
            email: default_email(),
            image_url: default_image_url(),
        }
    }
}

impl ProfileFieldMap {
    /// Build a profile from a user-details payload
    ///
    /// # Errors
    ///
    /// Returns an error if the payload carries no usable user id
    pub fn map(&self, payload: Value) -> Result<ProviderProfile, OAuth1Error> {
        let uid = lookup_string(&payload, &self.uid).ok_or_else(|| {
            OAuth1Error::InvalidResponse(format!(
                "User details response is missing the '{}' field",
                self.uid
            ))
        })?;

        Ok(ProviderProfile {
            uid,
            nickname: lookup_string(&payload, &self.nickname),
            name: lookup_string(&payload, &self.name),
            email: lookup_string(&payload, &self.email),
            image_url: lookup_string(&payload, &self.image_url),
            raw: payload,
        })
    }
}

/// Resolve a dot path and render strings, numbers and booleans as text
fn lookup_string(payload: &Value, path: &str) -> Option<String> {
    let value = path
        .split('.')
        .try_fold(payload, |current, segment| current.get(segment))?;

    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_map_reads_standard_fields() {
        let payload = json!({
            "uid": "42",
            "nickname": "jdoe",
            "name": "Jane Doe",
            "email": "j@example.com",
            "imageUrl": "http://x/img.png"
        });

        let profile = ProfileFieldMap::default().map(payload.clone()).unwrap();
        assert_eq!(profile.uid, "42");
        assert_eq!(profile.nickname.as_deref(), Some("jdoe"));
        assert_eq!(profile.name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.email.as_deref(), Some("j@example.com"));
        assert_eq!(profile.image_url.as_deref(), Some("http://x/img.png"));
        assert_eq!(profile.raw, payload);
    }

    #[test]
    fn test_numeric_uid_and_nested_paths() {
        let map = ProfileFieldMap {
            uid: "id".to_string(),
            nickname: "screen_name".to_string(),
            name: "profile.full_name".to_string(),
            email: "profile.email".to_string(),
            image_url: "profile_image_url_https".to_string(),
        };
        let payload = json!({
            "id": 783_214,
            "screen_name": "example",
            "profile": {"full_name": "Ex Ample", "email": null}
        });

        let profile = map.map(payload).unwrap();
        assert_eq!(profile.uid, "783214");
        assert_eq!(profile.nickname.as_deref(), Some("example"));
        assert_eq!(profile.name.as_deref(), Some("Ex Ample"));
        assert_eq!(profile.email, None);
        assert_eq!(profile.image_url, None);
    }

    #[test]
    fn test_missing_uid_is_rejected() {
        let result = ProfileFieldMap::default().map(json!({"name": "No Id"}));
        assert!(matches!(result, Err(OAuth1Error::InvalidResponse(_))));
    }
}
