//! The request abstraction the signer reads and mutates.
//!
//! [`SignableRequest`] is the narrow surface signing needs: the method, the
//! URL-encoded path, header access, the `Authorization` value and query
//! parameter insertion. [`HttpRequest`] is an owned implementation that keeps
//! header names exactly as written; `http::Request<B>` is supported as well.

use std::borrow::Cow;
use std::collections::BTreeMap;

use http::{HeaderName, HeaderValue, Method, Uri};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, percent_encode};

use crate::error::{SignerError, SignerResult};

/// `Content-MD5` header name.
pub const CONTENT_MD5_HEADER: &str = "content-md5";
/// `Content-Type` header name.
pub const CONTENT_TYPE_HEADER: &str = "content-type";
/// Date header written when a request is signed without one.
pub const AMZ_DATE_HEADER: &str = "x-amz-date";
/// `Authorization` header name.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Characters escaped in path segments: everything except RFC 3986
/// unreserved characters (`A-Z a-z 0-9 - _ . ~`).
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// An HTTP request that can be signed in place.
///
/// Header lookups by name ignore ASCII case. [`SignableRequest::headers`]
/// returns names as the request stores them.
pub trait SignableRequest {
    /// The HTTP method token, e.g. `GET`.
    fn method(&self) -> &str;

    /// The percent-encoded path, without the query string.
    fn url_encoded_path(&self) -> String;

    /// The value of the named header, if present.
    fn header(&self, name: &str) -> Option<&str>;

    /// Whether the named header is present.
    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Set a header, replacing any existing value for that name.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidHeader`] if the request rejects the name or value.
    fn set_header(&mut self, name: &str, value: &str) -> SignerResult<()>;

    /// All headers as `(name, value)` pairs, in the request's own order.
    fn headers(&self) -> Vec<(String, String)>;

    /// The `Authorization` value, if any.
    fn authorization(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER)
    }

    /// Set the `Authorization` value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidHeader`] if the request rejects the value.
    fn set_authorization(&mut self, value: &str) -> SignerResult<()> {
        self.set_header(AUTHORIZATION_HEADER, value)
    }

    /// Append a query string parameter.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidUri`] if the resulting URI is invalid.
    fn add_query_parameter(&mut self, name: &str, value: &str) -> SignerResult<()>;
}

/// Percent-encode a decoded path segment by segment, preserving `/`.
///
/// The path is taken as raw bytes so escapes that do not decode to UTF-8
/// (such as `%FF`) survive a decode/encode round trip. An empty path is
/// rendered as `/`.
///
/// # Examples
///
/// ```
/// use aws_sigv2_signer::request::url_encode_path;
///
/// assert_eq!(url_encode_path(""), "/");
/// assert_eq!(url_encode_path("/my photos/a+b.jpg"), "/my%20photos/a%2Bb.jpg");
/// assert_eq!(url_encode_path(b"/a\xFFb"), "/a%FFb");
/// ```
#[must_use]
pub fn url_encode_path<P: AsRef<[u8]> + ?Sized>(path: &P) -> String {
    let path = path.as_ref();
    if path.is_empty() {
        return "/".to_owned();
    }

    path.split(|&b| b == b'/')
        .map(|segment| percent_encode(segment, URI_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// An owned HTTP request.
///
/// Headers are kept in a map sorted by name; setting a header removes any
/// existing header whose name matches ignoring case, so the last write wins.
/// The path is stored as decoded bytes and encoded again when signed or rendered.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    scheme: Option<String>,
    authority: Option<String>,
    path: Vec<u8>,
    query: Vec<(String, String)>,
    headers: BTreeMap<String, String>,
}

impl HttpRequest {
    /// Create a request from a method and an absolute or origin-form URI.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidUri`] if `uri` does not parse.
    pub fn new(method: Method, uri: &str) -> SignerResult<Self> {
        let uri: Uri = uri
            .parse()
            .map_err(|e: http::uri::InvalidUri| SignerError::InvalidUri(e.to_string()))?;
        Ok(Self::from_uri(method, &uri))
    }

    /// Create a request from a method and a parsed URI.
    #[must_use]
    pub fn from_uri(method: Method, uri: &Uri) -> Self {
        let path: Vec<u8> = percent_decode_str(uri.path()).collect();
        let query = uri
            .query()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method,
            scheme: uri.scheme_str().map(ToOwned::to_owned),
            authority: uri.authority().map(|a| a.as_str().to_owned()),
            path,
            query,
            headers: BTreeMap::new(),
        }
    }

    /// Builder-style header setter.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.insert_header(name, value);
        self
    }

    /// The decoded request path; bytes that are not UTF-8 show as U+FFFD.
    #[must_use]
    pub fn path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// The first value of the named query parameter.
    #[must_use]
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All query parameters in insertion order.
    #[must_use]
    pub fn query_parameters(&self) -> &[(String, String)] {
        &self.query
    }

    /// The `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.query)
            .finish()
    }

    /// Render the request URI, optionally with its query string.
    #[must_use]
    pub fn uri_string(&self, include_query: bool) -> String {
        let mut uri = match (&self.scheme, &self.authority) {
            (Some(scheme), Some(authority)) => format!("{scheme}://{authority}"),
            _ => String::new(),
        };
        uri.push_str(&url_encode_path(&self.path));
        if include_query && !self.query.is_empty() {
            uri.push('?');
            uri.push_str(&self.query_string());
        }
        uri
    }

    /// Convert into an `http::Request` with an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Http`] if the URI or a header is rejected by `http`.
    pub fn into_http_request(self) -> SignerResult<http::Request<()>> {
        let uri = self.uri_string(true);
        let mut builder = http::Request::builder().method(self.method).uri(uri);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder.body(())?)
    }

    fn insert_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_owned(), value.to_owned());
    }
}

impl SignableRequest for HttpRequest {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn url_encoded_path(&self) -> String {
        url_encode_path(&self.path)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn set_header(&mut self, name: &str, value: &str) -> SignerResult<()> {
        self.insert_header(name, value);
        Ok(())
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn add_query_parameter(&mut self, name: &str, value: &str) -> SignerResult<()> {
        self.query.push((name.to_owned(), value.to_owned()));
        Ok(())
    }
}

/// Header values that are not visible ASCII are skipped by both `header` and
/// `headers`. When a name repeats, the last remaining value is the one seen by
/// `header` and the one kept by [`canonicalize_headers`](crate::canonical::canonicalize_headers).
impl<B> SignableRequest for http::Request<B> {
    fn method(&self) -> &str {
        self.method().as_str()
    }

    fn url_encoded_path(&self) -> String {
        // Decode first so an already-encoded path is not encoded twice.
        let decoded: Vec<u8> = percent_decode_str(self.uri().path()).collect();
        url_encode_path(&decoded)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .last()
    }

    fn set_header(&mut self, name: &str, value: &str) -> SignerResult<()> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SignerError::InvalidHeader(e.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| SignerError::InvalidHeader(e.to_string()))?;
        self.headers_mut().insert(name, value);
        Ok(())
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect()
    }

    fn add_query_parameter(&mut self, name: &str, value: &str) -> SignerResult<()> {
        let pair = form_urlencoded::Serializer::new(String::new())
            .append_pair(name, value)
            .finish();
        let path_and_query = match self.uri().query() {
            Some(query) if !query.is_empty() => {
                format!("{}?{query}&{pair}", self.uri().path())
            }
            _ => format!("{}?{pair}", self.uri().path()),
        };

        let mut parts = self.uri().clone().into_parts();
        parts.path_and_query = Some(
            path_and_query
                .parse()
                .map_err(|e: http::uri::InvalidUri| SignerError::InvalidUri(e.to_string()))?,
        );
        *self.uri_mut() =
            Uri::from_parts(parts).map_err(|e| SignerError::InvalidUri(e.to_string()))?;
        Ok(())
    }
}
