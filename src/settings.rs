use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::adapter::{HandshakeConfig, HandshakeMode};
use crate::oauth1::{
    ClientCredentials, HttpOAuth1Client, OAuth1Error, ProfileFieldMap, ServerEndpoints,
    SignatureMethod,
};

/// Environment variable naming a directory with a higher-priority `Settings.toml`
pub const SECRETS_DIR_ENV: &str = "LATCHKEY_SECRETS_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LatchkeySettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub cookies: CookieSettings,
    pub logging: LoggingSettings,
    pub handshake: HandshakeSettings,
    pub provider: ProviderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub redirect_base_url: String,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_secret: String,
    /// Lifetime of the session cookie carrying temporary credentials
    pub cookie_minutes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieSettings {
    pub secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeSettings {
    /// Correlate callbacks through the cache instead of the session
    pub stateless: bool,
    /// Cache namespace; the provider name when empty
    pub cache_namespace: String,
    pub cache_ttl_seconds: u64,
    pub callback_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub name: String,
    pub display_name: Option<String>,
    pub temporary_credentials_url: String,
    pub authorization_url: String,
    pub token_credentials_url: String,
    pub user_details_url: String,

    // Direct values (can be overridden by environment variables)
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Environment variable names for overrides
    pub client_id_env: Option<String>,
    pub client_secret_env: Option<String>,

    pub signature_method: SignatureMethod,
    pub profile_fields: ProfileFieldMap,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            redirect_base_url: "http://localhost:8080".to_string(),
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Will be generated if empty
            cookie_minutes: 15,
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self { secure: true }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            stateless: false,
            cache_namespace: String::new(),
            cache_ttl_seconds: 60,
            callback_path: "/auth/oauth1/callback".to_string(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: "oauth1".to_string(),
            display_name: None,
            temporary_credentials_url: String::new(),
            authorization_url: String::new(),
            token_credentials_url: String::new(),
            user_details_url: String::new(),
            client_id: None,
            client_secret: None,
            client_id_env: None,
            client_secret_env: None,
            signature_method: SignatureMethod::default(),
            profile_fields: ProfileFieldMap::default(),
        }
    }
}

impl LatchkeySettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - Logger initialization fails
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        env_logger::Builder::new()
            .parse_filters(&settings.logging.level)
            .try_init()?;

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `LATCHKEY_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        if let Some(root_settings) = Self::read_settings_file(Path::new("Settings.toml"))? {
            settings = root_settings;
            println!("✓ Loaded base settings from Settings.toml");
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            match Self::read_settings_file(&secrets_path)? {
                Some(secrets_settings) => {
                    println!("✓ Overriding settings from {}", secrets_path.display());
                    settings = secrets_settings;
                }
                None => println!(
                    "ℹ {SECRETS_DIR_ENV} set but no Settings.toml found at: {}",
                    secrets_path.display()
                ),
            }
        }

        Ok(settings)
    }

    /// Parse a settings file, or `None` when it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn read_settings_file(path: &Path) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        if !path.exists() {
            return Ok(None);
        }
        let toml_content = fs::read_to_string(path)?;
        Ok(Some(basic_toml::from_str(&toml_content)?))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_cookie_env_overrides(&mut settings.cookies);
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::apply_handshake_env_overrides(&mut settings.handshake);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(redirect_base_url) = std::env::var("REDIRECT_BASE_URL") {
            app_settings.redirect_base_url = redirect_base_url;
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = Self::generate_random_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    /// 32 random bytes, base64 encoded
    fn generate_random_session_secret() -> String {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        general_purpose::STANDARD.encode(secret)
    }

    fn warn_about_generated_secret() {
        eprintln!("⚠️  WARNING: Using auto-generated session secret");
        eprintln!("🔒 For production use, set the SESSION_SECRET environment variable");
        eprintln!("   or configure session_secret in Settings.toml");
        eprintln!("💡 In-flight handshakes are lost on restart unless the secret is configured");
    }

    fn apply_cookie_env_overrides(cookie_settings: &mut CookieSettings) {
        Self::apply_bool_env_override("COOKIE_SECURE", &mut cookie_settings.secure);
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Apply environment overrides for handshake settings
    pub fn apply_handshake_env_overrides(handshake_settings: &mut HandshakeSettings) {
        Self::apply_bool_env_override("HANDSHAKE_STATELESS", &mut handshake_settings.stateless);
        if let Ok(value_str) = std::env::var("HANDSHAKE_CACHE_TTL_SECONDS") {
            if let Ok(value) = value_str.parse::<u64>() {
                handshake_settings.cache_ttl_seconds = value;
            }
        }
    }

    fn apply_bool_env_override(env_var: &str, target: &mut bool) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<bool>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Absolute callback URI registered with the provider
    #[must_use]
    pub fn callback_uri(&self) -> String {
        format!(
            "{}{}",
            self.application.redirect_base_url.trim_end_matches('/'),
            self.handshake.callback_path
        )
    }

    #[must_use]
    pub fn handshake_mode(&self) -> HandshakeMode {
        if self.handshake.stateless {
            HandshakeMode::Stateless
        } else {
            HandshakeMode::Stateful
        }
    }

    #[must_use]
    pub fn handshake_config(&self) -> HandshakeConfig {
        let namespace = if self.handshake.cache_namespace.is_empty() {
            self.provider.name.clone()
        } else {
            self.handshake.cache_namespace.clone()
        };
        HandshakeConfig::new(self.callback_uri(), namespace)
            .with_cache_ttl(Duration::from_secs(self.handshake.cache_ttl_seconds))
    }
}

impl ProviderSettings {
    /// Get the client ID, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_id(&self) -> Option<String> {
        if let Some(env_var) = &self.client_id_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_id.clone()
    }

    /// Get the client secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_client_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.client_secret_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.client_secret.clone()
    }

    #[must_use]
    pub fn server_endpoints(&self) -> ServerEndpoints {
        ServerEndpoints {
            temporary_credentials_url: self.temporary_credentials_url.clone(),
            authorization_url: self.authorization_url.clone(),
            token_credentials_url: self.token_credentials_url.clone(),
            user_details_url: self.user_details_url.clone(),
        }
    }

    /// Build the HTTP client for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or an endpoint is invalid
    pub fn build_client(&self) -> Result<HttpOAuth1Client, OAuth1Error> {
        let credentials = ClientCredentials {
            identifier: self.get_client_id().unwrap_or_default(),
            secret: self.get_client_secret().unwrap_or_default(),
        };
        Ok(
            HttpOAuth1Client::new(self.name.clone(), credentials, self.server_endpoints())?
                .with_signature_method(self.signature_method)
                .with_profile_fields(self.profile_fields.clone()),
        )
    }
}
