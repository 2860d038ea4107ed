//! Shared-key request signing.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac as _};
use http::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderName, HeaderValue};
use secrecy::{ExposeSecret as _, SecretBox};
use sha2::Sha256;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use url::Url;

use super::{Authenticator, STORAGE_API_VERSION};
use crate::error::AuthError;
use crate::http_client::HttpRequest;

const X_MS_DATE: HeaderName = HeaderName::from_static("x-ms-date");
const X_MS_VERSION: HeaderName = HeaderName::from_static("x-ms-version");

/// Standard headers that take part in the string-to-sign, in signing order.
///
/// `Content-Length` is handled separately and the `Date` slot is always
/// blank because `x-ms-date` supersedes it.
const LEADING_HEADERS: [&str; 2] = ["content-encoding", "content-language"];
const MIDDLE_HEADERS: [&str; 2] = ["content-md5", "content-type"];
const TRAILING_HEADERS: [&str; 5] = [
    "if-modified-since",
    "if-match",
    "if-none-match",
    "if-unmodified-since",
    "range",
];

/// Signs requests with an HMAC-SHA256 over a canonicalized description of the request.
pub struct SharedKeyAuth {
    account: String,
    key: SecretBox<Vec<u8>>,
}

impl fmt::Debug for SharedKeyAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeyAuth")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl SharedKeyAuth {
    /// Create a signer from an account name and its base64-encoded shared key.
    ///
    /// The key is decoded once, here.
    pub fn new(account: impl Into<String>, encoded_key: &str) -> Result<Self, AuthError> {
        let key = STANDARD.decode(encoded_key.trim())?;
        Ok(Self {
            account: account.into(),
            key: SecretBox::new(Box::new(key)),
        })
    }

    /// The account the signatures are issued for.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Sign `request` as if it were sent at `now`.
    ///
    /// Sets `x-ms-date`, defaults `x-ms-version` and replaces `Authorization`.
    pub fn sign_at(&self, request: &mut HttpRequest, now: OffsetDateTime) -> Result<(), AuthError> {
        let date = now.to_offset(UtcOffset::UTC).format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))?;
        request
            .headers
            .insert(X_MS_DATE, HeaderValue::from_str(&date)?);
        request
            .headers
            .entry(X_MS_VERSION)
            .or_insert(HeaderValue::from_static(STORAGE_API_VERSION));

        let url = Url::parse(&request.url)?;
        let string_to_sign = self.string_to_sign(request, &url);

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.key.expose_secret()).map_err(|_| AuthError::KeyLength)?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let mut value = HeaderValue::from_str(&format!("SharedKey {}:{signature}", self.account))?;
        value.set_sensitive(true);
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    fn string_to_sign(&self, request: &HttpRequest, url: &Url) -> String {
        let mut out = String::new();
        out.push_str(request.method.as_str());
        out.push('\n');
        for name in LEADING_HEADERS {
            out.push_str(request.header_str(name));
            out.push('\n');
        }
        out.push_str(&content_length(request));
        out.push('\n');
        for name in MIDDLE_HEADERS {
            out.push_str(request.header_str(name));
            out.push('\n');
        }
        // Date.
        out.push('\n');
        for name in TRAILING_HEADERS {
            out.push_str(request.header_str(name));
            out.push('\n');
        }
        out.push_str(&canonicalized_headers(request));
        out.push_str(&self.canonicalized_resource(url));
        out
    }

    fn canonicalized_resource(&self, url: &Url) -> String {
        let path = match url.path() {
            "" => "/",
            p => p,
        };
        let mut resource = format!("/{}{path}", self.account);

        let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            if value.is_empty() {
                continue;
            }
            params
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        for (key, mut values) in params {
            values.sort();
            resource.push('\n');
            resource.push_str(&key.to_lowercase());
            resource.push(':');
            resource.push_str(&values.join(","));
        }
        resource
    }
}

impl Authenticator for SharedKeyAuth {
    async fn authorize(&self, request: &mut HttpRequest) -> Result<(), AuthError> {
        self.sign_at(request, OffsetDateTime::now_utc())
    }
}

/// The `Content-Length` slot: the explicit header if present, else the body length, blank for zero.
fn content_length(request: &HttpRequest) -> String {
    let explicit = request.header_str(CONTENT_LENGTH.as_str());
    let length = if explicit.is_empty() {
        request
            .body
            .as_ref()
            .map_or_else(String::new, |b| b.len().to_string())
    } else {
        explicit.to_owned()
    };
    if length == "0" { String::new() } else { length }
}

/// All `x-ms-*` headers, `name:value\n`, sorted by name.
fn canonicalized_headers(request: &HttpRequest) -> String {
    let mut selected = BTreeMap::new();
    for (name, value) in &request.headers {
        let name = name.as_str();
        if !name.starts_with("x-ms-") {
            continue;
        }
        if let Ok(value) = value.to_str() {
            selected.insert(name, value.trim());
        }
    }
    selected
        .into_iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use http::header::CONTENT_TYPE;
    use time::macros::datetime;

    const ACCOUNT: &str = "devstoreaccount1";
    const KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    fn signer() -> SharedKeyAuth {
        SharedKeyAuth::new(ACCOUNT, KEY).unwrap()
    }

    #[test]
    fn signs_get_with_query_and_custom_headers() {
        let mut request = HttpRequest::new(
            Method::GET,
            "https://devstoreaccount1.blob.core.windows.net/container/dir/file.txt?timeout=30&comp=metadata",
        )
        .with_header(
            HeaderName::from_static("x-ms-client-request-id"),
            HeaderValue::from_static("abc"),
        );

        signer()
            .sign_at(&mut request, datetime!(2024-01-02 03:04:05 UTC))
            .unwrap();

        assert_eq!(
            request.header_str("x-ms-date"),
            "Tue, 02 Jan 2024 03:04:05 GMT"
        );
        assert_eq!(request.header_str("x-ms-version"), STORAGE_API_VERSION);
        assert_eq!(
            request.header_str("authorization"),
            "SharedKey devstoreaccount1:J8D70wOs3XGNsaBswZ0i35e4GZunavpRw3C1hzV+LkI="
        );
    }

    #[test]
    fn signs_put_with_body_length_and_content_type() {
        let mut request = HttpRequest::new(
            Method::PUT,
            "https://devstoreaccount1.blob.core.windows.net/container/hello.txt",
        )
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"))
        .with_header(
            HeaderName::from_static("x-ms-blob-type"),
            HeaderValue::from_static("BlockBlob"),
        )
        .with_body("hello");

        signer()
            .sign_at(&mut request, datetime!(2024-01-02 03:04:05 UTC))
            .unwrap();

        assert_eq!(
            request.header_str("authorization"),
            "SharedKey devstoreaccount1:Z8WPMrmfg2V4tBw4wrDYc5ImUa61dgdQRgnanRvzlzo="
        );
    }

    #[test]
    fn signature_is_reproducible() {
        let sign = || {
            let mut request = HttpRequest::new(
                Method::GET,
                "https://devstoreaccount1.blob.core.windows.net/container/a",
            );
            signer()
                .sign_at(&mut request, datetime!(2024-05-06 07:08:09 UTC))
                .unwrap();
            request.header_str("authorization").to_owned()
        };
        assert_eq!(sign(), sign());
    }

    #[test]
    fn keeps_caller_version_and_unrelated_headers() {
        let mut request = HttpRequest::new(
            Method::GET,
            "https://devstoreaccount1.blob.core.windows.net/container/a",
        )
        .with_header(X_MS_VERSION, HeaderValue::from_static("2021-08-06"))
        .with_header(AUTHORIZATION, HeaderValue::from_static("Basic stale"))
        .with_header(
            HeaderName::from_static("x-request-tag"),
            HeaderValue::from_static("keep-me"),
        );

        signer()
            .sign_at(&mut request, datetime!(2024-01-02 03:04:05 UTC))
            .unwrap();

        assert_eq!(request.header_str("x-ms-version"), "2021-08-06");
        assert_eq!(request.header_str("x-request-tag"), "keep-me");
        assert!(request.header_str("authorization").starts_with("SharedKey "));
    }

    #[test]
    fn zero_content_length_is_blank() {
        let request = HttpRequest::new(Method::PUT, "https://example.test/c/a")
            .with_header(CONTENT_LENGTH, HeaderValue::from_static("0"));
        assert_eq!(content_length(&request), "");
    }

    #[test]
    fn query_values_are_sorted_and_joined() {
        let url = Url::parse("https://example.test/c/a?b=2&B=x&a=z&a=y&empty=").unwrap();
        assert_eq!(
            signer().canonicalized_resource(&url),
            "/devstoreaccount1/c/a\nb:x\na:y,z\nb:2"
        );
    }

    #[test]
    fn rejects_invalid_key() {
        assert!(matches!(
            SharedKeyAuth::new(ACCOUNT, "not base64!"),
            Err(AuthError::InvalidKey(_))
        ));
    }
}
