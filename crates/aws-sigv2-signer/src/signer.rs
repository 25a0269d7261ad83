//! AWS Signature Version 2 signer.
//!
//! [`AuthV2Signer::sign`] is the single signing primitive. Immediate signing
//! passes a negative expiry and writes `Authorization: AWS <akid>:<signature>`;
//! presigning passes an absolute epoch expiry and then copies the signature
//! into the `Signature`, `AWSAccessKeyId` and `Expires` query parameters.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::canonical::build_string_to_sign;
use crate::clock::{Clock, SystemClock, format_long_date};
use crate::config::{DEFAULT_EXPIRATION_SECS, SignerConfig};
use crate::credentials::CredentialProvider;
use crate::error::{SignerError, SignerResult};
use crate::hash::{HmacSha1, KeyedHash, encode_signature};
use crate::request::{AMZ_DATE_HEADER, SignableRequest};

/// Name reported by [`AuthV2Signer`].
pub const SIGV2_SIGNER_NAME: &str = "SignatureV2";
/// Query parameter carrying the presigned signature.
pub const SIGNATURE_QUERY_PARAM: &str = "Signature";
/// Query parameter carrying the presigning access key ID.
pub const ACCESS_KEY_ID_QUERY_PARAM: &str = "AWSAccessKeyId";
/// Query parameter carrying the presigned expiry (seconds since the epoch).
pub const EXPIRES_QUERY_PARAM: &str = "Expires";

const AUTHORIZATION_PREFIX: &str = "AWS ";

/// A request signing strategy.
///
/// The presign forms taking a region or service exist so strategies that scope
/// signatures can share one interface; by default they funnel into
/// [`RequestSigner::presign_request_for_service`].
pub trait RequestSigner: Send + Sync {
    /// Name of the signing scheme.
    fn name(&self) -> &'static str;

    /// Sign `request` for immediate use.
    ///
    /// # Errors
    ///
    /// Returns an error if the digest cannot be computed or the request
    /// rejects a mutation.
    fn sign_request(&self, request: &mut dyn SignableRequest) -> SignerResult<()>;

    /// Presign `request` so it is valid for `expiration_in_seconds` from now.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::presign_request_for_service`].
    fn presign_request(
        &self,
        request: &mut dyn SignableRequest,
        expiration_in_seconds: i64,
    ) -> SignerResult<()> {
        self.presign_request_in_region(request, "", expiration_in_seconds)
    }

    /// Presign `request` for a region.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::presign_request_for_service`].
    fn presign_request_in_region(
        &self,
        request: &mut dyn SignableRequest,
        region: &str,
        expiration_in_seconds: i64,
    ) -> SignerResult<()> {
        self.presign_request_for_service(request, region, "", expiration_in_seconds)
    }

    /// Presign `request` for a region and service.
    ///
    /// # Errors
    ///
    /// Returns an error if the digest cannot be computed or the request
    /// rejects a mutation.
    fn presign_request_for_service(
        &self,
        request: &mut dyn SignableRequest,
        region: &str,
        service_name: &str,
        expiration_in_seconds: i64,
    ) -> SignerResult<()>;
}

/// Signs requests with AWS Signature Version 2 (HMAC-SHA1).
///
/// The signer is immutable after construction and can be shared across
/// threads; credentials are fetched from the provider on every call.
pub struct AuthV2Signer {
    credentials_provider: Arc<dyn CredentialProvider>,
    hmac: Arc<dyn KeyedHash>,
    clock: Arc<dyn Clock>,
    default_expiration_secs: i64,
}

impl AuthV2Signer {
    /// Create a signer using HMAC-SHA1 and the system clock.
    #[must_use]
    pub fn new(credentials_provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials_provider,
            hmac: Arc::new(HmacSha1),
            clock: Arc::new(SystemClock),
            default_expiration_secs: DEFAULT_EXPIRATION_SECS,
        }
    }

    /// Create a signer from configuration.
    #[must_use]
    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(config.credential_provider())
            .with_default_expiration(config.default_expiration_secs)
    }

    /// Replace the keyed-hash primitive.
    #[must_use]
    pub fn with_hasher(mut self, hmac: Arc<dyn KeyedHash>) -> Self {
        self.hmac = hmac;
        self
    }

    /// Replace the clock used for date headers and presign expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the expiry used by [`AuthV2Signer::presign_with_default_expiration`].
    #[must_use]
    pub fn with_default_expiration(mut self, expiration_in_seconds: i64) -> Self {
        self.default_expiration_secs = expiration_in_seconds;
        self
    }

    /// The expiry used by [`AuthV2Signer::presign_with_default_expiration`].
    #[must_use]
    pub fn default_expiration_secs(&self) -> i64 {
        self.default_expiration_secs
    }

    /// The current signing time.
    #[must_use]
    pub fn signing_timestamp(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Sign `request` in place.
    ///
    /// A negative `expires` signs for immediate use: the fourth line of the
    /// string to sign is empty and an `x-amz-date` header is added if the
    /// request has none. A non-negative `expires` is an absolute epoch expiry
    /// written into that line.
    ///
    /// Anonymous credentials leave the request untouched and succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Digest`] if the keyed hash fails. A date header
    /// added before the failure stays on the request.
    pub fn sign(&self, request: &mut dyn SignableRequest, expires: i64) -> SignerResult<()> {
        self.sign_with_authorization(request, expires).map(|_| ())
    }

    /// Sign `request` and return the `Authorization` value written, or `None`
    /// when anonymous credentials left the request unsigned.
    fn sign_with_authorization(
        &self,
        request: &mut dyn SignableRequest,
        expires: i64,
    ) -> SignerResult<Option<String>> {
        let credentials = self.credentials_provider.get_credentials();
        if credentials.is_anonymous() {
            debug!("Anonymous credentials, request left unsigned");
            return Ok(None);
        }

        let expires = (expires >= 0).then_some(expires);
        if expires.is_none() && !request.has_header(AMZ_DATE_HEADER) {
            let date = format_long_date(&self.signing_timestamp());
            request.set_header(AMZ_DATE_HEADER, &date)?;
        }

        let string_to_sign = build_string_to_sign(&*request, expires);
        debug!(string_to_sign = ?string_to_sign, "Built SigV2 string to sign");

        let digest = match self.hmac.calculate(
            string_to_sign.as_bytes(),
            credentials.secret_key().as_bytes(),
        ) {
            Ok(digest) => digest,
            Err(e) => {
                error!(error = %e, string_to_sign = ?string_to_sign, "Failed to hash SigV2 string to sign");
                return Err(e);
            }
        };

        let signature = encode_signature(&digest);
        let authorization = format!(
            "{AUTHORIZATION_PREFIX}{}:{signature}",
            credentials.access_key_id()
        );
        debug!(authorization = %authorization, "Signing request");
        request.set_authorization(&authorization)?;
        Ok(Some(authorization))
    }

    /// Presign `request` using the configured default expiry.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::presign_request_for_service`].
    pub fn presign_with_default_expiration(
        &self,
        request: &mut dyn SignableRequest,
    ) -> SignerResult<()> {
        self.presign_request(request, self.default_expiration_secs)
    }
}

impl RequestSigner for AuthV2Signer {
    fn name(&self) -> &'static str {
        SIGV2_SIGNER_NAME
    }

    fn sign_request(&self, request: &mut dyn SignableRequest) -> SignerResult<()> {
        self.sign(request, -1)
    }

    /// Region and service do not take part in SigV2 and are ignored.
    fn presign_request_for_service(
        &self,
        request: &mut dyn SignableRequest,
        _region: &str,
        _service_name: &str,
        expiration_in_seconds: i64,
    ) -> SignerResult<()> {
        let epoch = self
            .signing_timestamp()
            .timestamp()
            .saturating_add(expiration_in_seconds);
        // An Authorization already on the request does not count: only a
        // value written by this call may be copied into the query string.
        let Some(authorization) = self.sign_with_authorization(request, epoch)? else {
            return Ok(());
        };

        let (access_key_id, signature) = parse_authorization(&authorization)?;
        request.add_query_parameter(SIGNATURE_QUERY_PARAM, signature)?;
        request.add_query_parameter(ACCESS_KEY_ID_QUERY_PARAM, access_key_id)?;
        request.add_query_parameter(EXPIRES_QUERY_PARAM, &epoch.to_string())?;

        debug!(
            path = %request.url_encoded_path(),
            expires = epoch,
            "Presigned request"
        );
        Ok(())
    }
}

impl fmt::Debug for AuthV2Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthV2Signer")
            .field("name", &SIGV2_SIGNER_NAME)
            .field("default_expiration_secs", &self.default_expiration_secs)
            .finish_non_exhaustive()
    }
}

/// Split `AWS <akid>:<signature>` into its access key ID and signature.
fn parse_authorization(authorization: &str) -> SignerResult<(&str, &str)> {
    authorization
        .strip_prefix(AUTHORIZATION_PREFIX)
        .and_then(|rest| rest.split_once(':'))
        .filter(|(_, signature)| !signature.contains(':'))
        .ok_or_else(|| SignerError::MalformedAuthorization(authorization.to_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::Method;

    use super::*;
    use crate::clock::FixedClock;
    use crate::credentials::{AnonymousCredentialProvider, StaticCredentialProvider};
    use crate::request::HttpRequest;

    const TEST_ACCESS_KEY: &str = "AKIDEXAMPLE";
    const TEST_SECRET_KEY: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const TEST_DATE: &str = "Thu, 17 Nov 2005 18:49:58 GMT";
    const TEST_EPOCH: i64 = 1_132_253_398;

    #[derive(Debug)]
    struct FailingHash;

    impl KeyedHash for FailingHash {
        fn calculate(&self, _message: &[u8], _key: &[u8]) -> SignerResult<Vec<u8>> {
            Err(SignerError::Digest("digest unavailable".to_owned()))
        }
    }

    fn test_signer() -> AuthV2Signer {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2005, 11, 17, 18, 49, 58).unwrap());
        AuthV2Signer::new(Arc::new(StaticCredentialProvider::new(
            TEST_ACCESS_KEY,
            TEST_SECRET_KEY,
        )))
        .with_clock(Arc::new(clock))
    }

    fn anonymous_signer() -> AuthV2Signer {
        AuthV2Signer::new(Arc::new(AnonymousCredentialProvider))
    }

    fn request(method: Method, uri: &str) -> HttpRequest {
        HttpRequest::new(method, uri).unwrap()
    }

    fn expected_signature(string_to_sign: &str) -> String {
        let digest = HmacSha1
            .calculate(string_to_sign.as_bytes(), TEST_SECRET_KEY.as_bytes())
            .unwrap();
        encode_signature(&digest)
    }

    #[test]
    fn test_should_report_signature_v2_name() {
        assert_eq!(test_signer().name(), "SignatureV2");
    }

    #[test]
    fn test_should_sign_vanilla_get() {
        let mut req = request(Method::GET, "http://example.amazonaws.com/")
            .with_header("x-amz-date", TEST_DATE);

        test_signer().sign_request(&mut req).unwrap();

        assert_eq!(
            req.authorization(),
            Some("AWS AKIDEXAMPLE:DrnfaazHeLA7tSZEMROdwJiBx5I=")
        );
        assert_eq!(req.header("x-amz-date"), Some(TEST_DATE));
    }

    #[test]
    fn test_should_add_date_header_when_missing() {
        let mut req = request(Method::GET, "http://example.amazonaws.com/");

        test_signer().sign_request(&mut req).unwrap();

        assert_eq!(req.header("x-amz-date"), Some(TEST_DATE));
        assert_eq!(
            req.authorization(),
            Some("AWS AKIDEXAMPLE:DrnfaazHeLA7tSZEMROdwJiBx5I=")
        );
    }

    #[test]
    fn test_should_sign_content_headers_and_amz_metadata() {
        let mut req = request(Method::PUT, "http://example.amazonaws.com/quotes/nelson")
            .with_header("Content-MD5", "c8fdb181845a4ca6b8fec737b3581d76")
            .with_header("Content-Type", "text/html")
            .with_header("x-amz-meta-author", " foo@bar.com ")
            .with_header("user-agent", "curl/7.15.5");

        test_signer().sign_request(&mut req).unwrap();

        assert_eq!(
            req.authorization(),
            Some("AWS AKIDEXAMPLE:rD/0mMvjGZCPOV+ob0ge04ArGbo=")
        );
    }

    #[test]
    fn test_should_sign_url_encoded_path() {
        let mut req = request(Method::GET, "http://example.amazonaws.com/my%20photos/a+b.jpg?acl")
            .with_header("x-amz-date", TEST_DATE);

        test_signer().sign_request(&mut req).unwrap();

        assert_eq!(
            req.authorization(),
            Some("AWS AKIDEXAMPLE:bZWxDqR/0vMxWKdflO38jMYsVAE=")
        );
    }

    #[test]
    fn test_should_not_sign_mixed_case_amz_header() {
        let mut req = request(Method::GET, "http://example.amazonaws.com/")
            .with_header("X-Amz-Date", TEST_DATE);

        test_signer().sign_request(&mut req).unwrap();

        let expected = format!("AWS {TEST_ACCESS_KEY}:{}", expected_signature("GET\n\n\n\n/"));
        assert_eq!(req.authorization(), Some(expected.as_str()));
    }

    #[test]
    fn test_should_overwrite_signature_with_identical_value() {
        let mut req = request(Method::GET, "http://example.amazonaws.com/bucket/key");
        let signer = test_signer();

        signer.sign_request(&mut req).unwrap();
        let first = req.authorization().map(ToOwned::to_owned);
        signer.sign_request(&mut req).unwrap();

        assert_eq!(req.authorization().map(ToOwned::to_owned), first);
        assert_eq!(SignableRequest::headers(&req).len(), 2);
    }

    #[test]
    fn test_should_leave_request_untouched_for_anonymous_credentials() {
        let original = request(Method::GET, "http://example.amazonaws.com/bucket/key?x=1")
            .with_header("Content-Type", "text/plain");
        let signer = anonymous_signer();

        let mut signed = original.clone();
        signer.sign_request(&mut signed).unwrap();
        assert_eq!(SignableRequest::headers(&signed), SignableRequest::headers(&original));
        assert_eq!(signed.uri_string(true), original.uri_string(true));

        let mut presigned = original.clone();
        signer.presign_request(&mut presigned, 3600).unwrap();
        assert_eq!(SignableRequest::headers(&presigned), SignableRequest::headers(&original));
        assert_eq!(presigned.query_parameters(), original.query_parameters());
        assert!(presigned.authorization().is_none());
    }

    #[test]
    fn test_should_not_copy_existing_authorization_when_anonymous() {
        let signer = anonymous_signer();

        for existing in ["AWS AKIDOLD:c3RhbGU=", "Bearer tok"] {
            let mut req = request(Method::GET, "https://s3.amazonaws.com/bucket/key")
                .with_header("Authorization", existing);

            signer.presign_request(&mut req, 60).unwrap();

            assert!(req.query_parameters().is_empty());
            assert_eq!(req.authorization(), Some(existing));
        }
    }

    #[test]
    fn test_should_fail_when_digest_fails() {
        let signer = test_signer().with_hasher(Arc::new(FailingHash));
        let mut req = request(Method::GET, "http://example.amazonaws.com/");

        let result = signer.sign_request(&mut req);

        assert!(matches!(result, Err(SignerError::Digest(_))));
        assert!(req.authorization().is_none());
        assert_eq!(req.header("x-amz-date"), Some(TEST_DATE));
    }

    #[test]
    fn test_should_presign_with_expiry_query_parameters() {
        let mut req = request(
            Method::GET,
            "https://s3.amazonaws.com/examplebucket/photos/puppy.jpg",
        );

        test_signer().presign_request(&mut req, 3600).unwrap();

        assert_eq!(
            req.query_parameters(),
            &[
                ("Signature".to_owned(), "GJSaIimGnqaImqi0vKSh9XdinMo=".to_owned()),
                ("AWSAccessKeyId".to_owned(), TEST_ACCESS_KEY.to_owned()),
                ("Expires".to_owned(), (TEST_EPOCH + 3600).to_string()),
            ]
        );
        assert!(!req.has_header("x-amz-date"));
        assert_eq!(
            req.authorization(),
            Some("AWS AKIDEXAMPLE:GJSaIimGnqaImqi0vKSh9XdinMo=")
        );
        assert_eq!(
            req.uri_string(true),
            "https://s3.amazonaws.com/examplebucket/photos/puppy.jpg\
             ?Signature=GJSaIimGnqaImqi0vKSh9XdinMo%3D&AWSAccessKeyId=AKIDEXAMPLE&Expires=1132256998"
        );
    }

    #[test]
    fn test_should_match_direct_sign_with_same_epoch() {
        let signer = test_signer();
        let epoch = TEST_EPOCH + 600;

        let mut presigned = request(Method::GET, "https://s3.amazonaws.com/bucket/key")
            .with_header("x-amz-meta-owner", "alice");
        signer.presign_request(&mut presigned, 600).unwrap();

        let mut signed = request(Method::GET, "https://s3.amazonaws.com/bucket/key")
            .with_header("x-amz-meta-owner", "alice");
        signer.sign(&mut signed, epoch).unwrap();
        let (access_key_id, signature) =
            parse_authorization(signed.authorization().unwrap()).unwrap();

        assert_eq!(presigned.query_parameter("Signature"), Some(signature));
        assert_eq!(presigned.query_parameter("AWSAccessKeyId"), Some(access_key_id));
        assert_eq!(
            presigned.query_parameter("Expires"),
            Some(epoch.to_string().as_str())
        );
    }

    #[test]
    fn test_should_ignore_region_and_service_when_presigning() {
        let signer = test_signer();
        let uri = "https://s3.amazonaws.com/bucket/key";

        let mut plain = request(Method::GET, uri);
        signer.presign_request(&mut plain, 300).unwrap();
        let mut regional = request(Method::GET, uri);
        signer
            .presign_request_in_region(&mut regional, "eu-west-1", 300)
            .unwrap();
        let mut scoped = request(Method::GET, uri);
        signer
            .presign_request_for_service(&mut scoped, "eu-west-1", "s3", 300)
            .unwrap();

        assert_eq!(plain.query_parameters(), regional.query_parameters());
        assert_eq!(plain.query_parameters(), scoped.query_parameters());
    }

    #[test]
    fn test_should_propagate_digest_failure_when_presigning() {
        let signer = test_signer().with_hasher(Arc::new(FailingHash));
        let mut req = request(Method::GET, "https://s3.amazonaws.com/bucket/key");

        let result = signer.presign_request(&mut req, 60);

        assert!(matches!(result, Err(SignerError::Digest(_))));
        assert!(req.query_parameters().is_empty());
    }

    #[test]
    fn test_should_presign_with_default_expiration() {
        let signer = test_signer().with_default_expiration(120);
        let mut req = request(Method::GET, "https://s3.amazonaws.com/bucket/key");

        signer.presign_with_default_expiration(&mut req).unwrap();

        let expected = (TEST_EPOCH + 120).to_string();
        assert_eq!(req.query_parameter("Expires"), Some(expected.as_str()));
    }

    #[test]
    fn test_should_parse_authorization_value() {
        assert_eq!(
            parse_authorization("AWS AKID:c2lnbmF0dXJl").unwrap(),
            ("AKID", "c2lnbmF0dXJl")
        );
        assert!(parse_authorization("AWS4-HMAC-SHA256 Credential=x").is_err());
        assert!(parse_authorization("AWS nocolon").is_err());
        assert!(parse_authorization("AWS a:b:c").is_err());
    }

    #[test]
    fn test_should_sign_http_crate_request() {
        let mut req = http::Request::builder()
            .method("GET")
            .uri("http://example.amazonaws.com/")
            .body(())
            .unwrap();

        test_signer().sign_request(&mut req).unwrap();

        assert_eq!(req.headers()["x-amz-date"], TEST_DATE);
        assert_eq!(
            req.headers()["authorization"],
            "AWS AKIDEXAMPLE:DrnfaazHeLA7tSZEMROdwJiBx5I="
        );
    }

    #[test]
    fn test_should_share_signer_across_threads() {
        let signer: Arc<dyn RequestSigner> = Arc::new(test_signer());

        let signatures: Vec<Option<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let signer = Arc::clone(&signer);
                    scope.spawn(move || {
                        let mut req = request(Method::GET, "http://example.amazonaws.com/");
                        signer.sign_request(&mut req).unwrap();
                        req.authorization().map(ToOwned::to_owned)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(signatures.iter().all(|s| {
            s.as_deref() == Some("AWS AKIDEXAMPLE:DrnfaazHeLA7tSZEMROdwJiBx5I=")
        }));
    }
}
