//! Service Bus connection strings and shared access signatures
//!
//! A connection string is a `;`-separated list of `Key=Value` pairs:
//!
//! ```text
//! Endpoint=sb://<namespace>.servicebus.windows.net/;SharedAccessKeyName=<name>;SharedAccessKey=<key>[;EntityPath=<queue>]
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use relayq_types::{Error, Result};
use sha2::Sha256;
use url::{form_urlencoded, Url};

type HmacSha256 = Hmac<Sha256>;

/// Parsed broker connection string
#[derive(Clone)]
pub struct ConnectionString {
    /// HTTP(S) base address of the namespace, always ending in `/`
    endpoint: Url,
    credential: SharedAccessKey,
    /// Queue named by the connection string itself, if any
    entity_path: Option<String>,
}

impl ConnectionString {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn credential(&self) -> &SharedAccessKey {
        &self.credential
    }

    pub fn entity_path(&self) -> Option<&str> {
        self.entity_path.as_deref()
    }
}

impl FromStr for ConnectionString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut key_name = None;
        let mut key = None;
        let mut entity_path = None;
        let mut emulator = false;

        for segment in s.split(';').map(str::trim).filter(|seg| !seg.is_empty()) {
            // Keys may contain '=' padding, so split on the first one only
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                Error::Configuration("connection string segment without '='".to_string())
            })?;
            let value = value.trim();

            match name.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.to_string()),
                "sharedaccesskeyname" => key_name = Some(value.to_string()),
                "sharedaccesskey" => key = Some(value.to_string()),
                "entitypath" if !value.is_empty() => entity_path = Some(value.to_string()),
                "usedevelopmentemulator" => emulator = value.eq_ignore_ascii_case("true"),
                _ => {}
            }
        }

        let endpoint = endpoint.ok_or_else(|| missing("Endpoint"))?;
        let key_name = key_name.ok_or_else(|| missing("SharedAccessKeyName"))?;
        let key = key.ok_or_else(|| missing("SharedAccessKey"))?;

        Ok(Self {
            endpoint: http_endpoint(&endpoint, emulator)?,
            credential: SharedAccessKey::new(key_name, key),
            entity_path,
        })
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("endpoint", &self.endpoint.as_str())
            .field("credential", &self.credential)
            .field("entity_path", &self.entity_path)
            .finish()
    }
}

fn missing(key: &str) -> Error {
    Error::Configuration(format!("connection string is missing {}", key))
}

/// Map the namespace endpoint onto the scheme used by the HTTP send API
fn http_endpoint(raw: &str, emulator: bool) -> Result<Url> {
    let parsed = Url::parse(raw)
        .map_err(|e| Error::Configuration(format!("invalid Endpoint '{}': {}", raw, e)))?;

    let scheme = match (parsed.scheme(), emulator) {
        ("sb", true) | ("http", _) => "http",
        ("sb", false) | ("https", _) => "https",
        (other, _) => {
            return Err(Error::Configuration(format!(
                "unsupported Endpoint scheme '{}'",
                other
            )))
        }
    };

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::Configuration(format!("Endpoint '{}' has no host", raw)))?;

    let base = match parsed.port() {
        Some(port) => format!("{}://{}:{}/", scheme, host, port),
        None => format!("{}://{}/", scheme, host),
    };

    Url::parse(&base).map_err(|e| Error::Configuration(format!("invalid Endpoint '{}': {}", raw, e)))
}

/// Named shared access key used to sign broker requests
#[derive(Clone)]
pub struct SharedAccessKey {
    name: String,
    key: String,
}

impl SharedAccessKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build an `Authorization` header value for `resource_uri`, valid until
    /// `expiry` (seconds since the Unix epoch)
    ///
    /// Format: `SharedAccessSignature sr=<uri>&sig=<signature>&se=<expiry>&skn=<name>`
    /// where the signature is the base64 HMAC-SHA256 of `"<encoded uri>\n<expiry>"`.
    pub fn token(&self, resource_uri: &str, expiry: i64) -> Result<String> {
        let encoded_uri = encode(resource_uri);
        let string_to_sign = format!("{}\n{}", encoded_uri, expiry);

        let mut mac = HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| Error::Configuration(format!("unusable shared access key: {}", e)))?;
        mac.update(string_to_sign.as_bytes());
        let signature = BASE64.encode(mac.finalize().into_bytes());

        Ok(format!(
            "SharedAccessSignature sr={}&sig={}&se={}&skn={}",
            encoded_uri,
            encode(&signature),
            expiry,
            encode(&self.name)
        ))
    }
}

impl fmt::Debug for SharedAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAccessKey")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .finish()
    }
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONNECTION: &str = "Endpoint=sb://example.servicebus.windows.net/;SharedAccessKeyName=RootManageSharedAccessKey;SharedAccessKey=c2VjcmV0LWtleQ==";

    fn token_fields(token: &str) -> HashMap<String, String> {
        let query = token
            .strip_prefix("SharedAccessSignature ")
            .expect("token prefix");
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn test_parse_connection_string() {
        let conn: ConnectionString = CONNECTION.parse().unwrap();

        assert_eq!(conn.endpoint().as_str(), "https://example.servicebus.windows.net/");
        assert_eq!(conn.credential().name(), "RootManageSharedAccessKey");
        assert_eq!(conn.credential().key, "c2VjcmV0LWtleQ==");
        assert_eq!(conn.entity_path(), None);
    }

    #[test]
    fn test_parse_entity_path_and_case_insensitive_keys() {
        let conn: ConnectionString = format!("{};entitypath=orders;", CONNECTION.to_lowercase())
            .parse()
            .unwrap();
        assert_eq!(conn.entity_path(), Some("orders"));
    }

    #[test]
    fn test_emulator_uses_plain_http_and_keeps_port() {
        let conn: ConnectionString =
            "Endpoint=sb://127.0.0.1:5300;SharedAccessKeyName=k;SharedAccessKey=s;UseDevelopmentEmulator=true"
                .parse()
                .unwrap();
        assert_eq!(conn.endpoint().as_str(), "http://127.0.0.1:5300/");
    }

    #[test]
    fn test_missing_parts_are_configuration_errors() {
        let err = "Endpoint=sb://example.servicebus.windows.net/;SharedAccessKeyName=k"
            .parse::<ConnectionString>()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("SharedAccessKey")));

        assert!("just-a-secret".parse::<ConnectionString>().is_err());
        assert!("Endpoint=ftp://host/;SharedAccessKeyName=k;SharedAccessKey=s"
            .parse::<ConnectionString>()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let conn: ConnectionString = CONNECTION.parse().unwrap();
        let rendered = format!("{:?}", conn);
        assert!(!rendered.contains("c2VjcmV0LWtleQ=="));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_token_layout() {
        let key = SharedAccessKey::new("RootManageSharedAccessKey", "secret");
        let token = key
            .token("https://example.servicebus.windows.net/orders", 1_900_000_000)
            .unwrap();

        assert!(token.starts_with(
            "SharedAccessSignature sr=https%3A%2F%2Fexample.servicebus.windows.net%2Forders&sig="
        ));

        let fields = token_fields(&token);
        assert_eq!(fields["sr"], "https://example.servicebus.windows.net/orders");
        assert_eq!(fields["se"], "1900000000");
        assert_eq!(fields["skn"], "RootManageSharedAccessKey");
    }

    #[test]
    fn test_token_signature_verifies() {
        let key = SharedAccessKey::new("k", "secret");
        let uri = "https://example.servicebus.windows.net/orders";
        let token = key.token(uri, 42).unwrap();

        let signature = BASE64.decode(&token_fields(&token)["sig"]).unwrap();
        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(format!("{}\n42", encode(uri)).as_bytes());
        assert!(mac.verify_slice(&signature).is_ok());
    }

    #[test]
    fn test_token_changes_with_expiry() {
        let key = SharedAccessKey::new("k", "secret");
        let uri = "https://example.servicebus.windows.net/orders";
        assert_ne!(
            token_fields(&key.token(uri, 1).unwrap())["sig"],
            token_fields(&key.token(uri, 2).unwrap())["sig"]
        );
    }
}
