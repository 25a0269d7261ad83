//! String-to-sign construction for AWS Signature Version 2.
//!
//! ```text
//! HTTP-Verb + "\n" +
//! Content-MD5 + "\n" +
//! Content-Type + "\n" +
//! (Expires | "") + "\n" +
//! CanonicalizedAmzHeaders +
//! URLEncodedPath
//! ```
//!
//! The four leading lines are always present; a missing header contributes an
//! empty line. Each signed header contributes `name:value\n`, ordered by name.

use std::collections::BTreeMap;

use crate::request::{CONTENT_MD5_HEADER, CONTENT_TYPE_HEADER, SignableRequest};

/// Prefix selecting the headers that take part in the signature.
const SIGNED_HEADER_PREFIX: &[u8] = b"x-amz-";

/// Trim every header name and value, keeping the last value for a name.
///
/// Names are not lowercased. The result iterates in name order.
///
/// # Examples
///
/// ```
/// use aws_sigv2_signer::canonical::canonicalize_headers;
///
/// let headers = canonicalize_headers(vec![
///     (" x-amz-meta-a ".to_owned(), " 1 ".to_owned()),
///     ("x-amz-meta-a".to_owned(), "2".to_owned()),
/// ]);
/// assert_eq!(headers.get("x-amz-meta-a").map(String::as_str), Some("2"));
/// ```
#[must_use]
pub fn canonicalize_headers<I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    headers
        .into_iter()
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .collect()
}

/// Whether a canonicalized header name is signed: a literal, case-sensitive
/// `x-amz-` prefix.
#[must_use]
pub fn should_sign_header(name: &str) -> bool {
    name.as_bytes().starts_with(SIGNED_HEADER_PREFIX)
}

/// Build the SigV2 string to sign for `request`.
///
/// With `expires` set, its decimal value fills the fourth line; otherwise the
/// line is empty and the request's date travels in a signed `x-amz-date`
/// header instead.
#[must_use]
pub fn build_string_to_sign(request: &dyn SignableRequest, expires: Option<i64>) -> String {
    let content_md5 = request.header(CONTENT_MD5_HEADER).unwrap_or("");
    let content_type = request.header(CONTENT_TYPE_HEADER).unwrap_or("");
    let expires = expires.map(|e| e.to_string()).unwrap_or_default();

    let mut string_to_sign = format!(
        "{}\n{content_md5}\n{content_type}\n{expires}\n",
        request.method()
    );

    for (name, value) in canonicalize_headers(request.headers()) {
        if should_sign_header(&name) {
            string_to_sign.push_str(&name);
            string_to_sign.push(':');
            string_to_sign.push_str(&value);
            string_to_sign.push('\n');
        }
    }

    string_to_sign.push_str(&request.url_encoded_path());
    string_to_sign
}
