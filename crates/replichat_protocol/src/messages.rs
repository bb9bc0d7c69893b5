//! Protocol messages for pull.

use crate::error::{ProtocolError, ProtocolResult};
use crate::patch::{Patch, PatchOperation};
use crate::record::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Pull protocol version understood by this crate.
pub const PULL_VERSION: u64 = 0;

/// Client-held watermark: the global version as of the client's last pull.
///
/// `Cookie::NONE` means the client has no prior state and must discard its
/// cache before applying the patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cookie(Option<Version>);

impl Cookie {
    /// Cookie of a client with no prior state.
    pub const NONE: Cookie = Cookie(None);

    /// Creates a cookie at the given version.
    pub fn at(version: Version) -> Self {
        Cookie(Some(version))
    }

    /// Returns the version, if any.
    pub fn version(&self) -> Option<Version> {
        self.0
    }

    /// Returns the version to diff against (0 when absent).
    pub fn baseline(&self) -> Version {
        self.0.unwrap_or(0)
    }

    /// Returns true if the client must clear its cache.
    ///
    /// Only an absent cookie resets; `0` is an ordinary baseline.
    pub fn requests_reset(&self) -> bool {
        self.0.is_none()
    }

    /// Parses a cookie from its JSON representation.
    ///
    /// Accepts `null`, a non-negative integer, or a string of decimal digits.
    /// Anything else is rejected rather than coerced.
    pub fn from_json(value: &Value) -> ProtocolResult<Self> {
        parse_version(value)
            .map(Cookie)
            .map_err(ProtocolError::MalformedCookie)
    }
}

impl From<Version> for Cookie {
    fn from(version: Version) -> Self {
        Cookie::at(version)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(version) => write!(f, "{version}"),
            None => f.write_str("null"),
        }
    }
}

fn parse_version(value: &Value) -> Result<Option<Version>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("expected non-negative integer, got {n}")),
        Value::String(s) => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("expected decimal digits, got {s:?}"));
            }
            s.parse::<Version>()
                .map(Some)
                .map_err(|e| format!("{s:?}: {e}"))
        }
        other => Err(format!("unexpected value {other}")),
    }
}

/// Wire shape of a pull request before validation.
#[derive(Debug, Deserialize)]
struct RawPullRequest {
    #[serde(rename = "clientID", default)]
    client_id: Option<String>,
    #[serde(default)]
    cookie: Option<Value>,
    #[serde(rename = "pullVersion", default)]
    pull_version: Option<Value>,
}

/// Pull request from a client.
///
/// Other fields of the sync protocol (pending mutations, schema version) are
/// ignored; they belong to the push path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    /// Client ID.
    #[serde(rename = "clientID")]
    pub client_id: String,
    /// Client's cookie.
    pub cookie: Cookie,
    /// Pull protocol version, if the client sent one.
    #[serde(rename = "pullVersion", skip_serializing_if = "Option::is_none")]
    pub pull_version: Option<u64>,
}

impl PullRequest {
    /// Creates a new pull request.
    pub fn new(client_id: impl Into<String>, cookie: Cookie) -> Self {
        Self {
            client_id: client_id.into(),
            cookie,
            pull_version: None,
        }
    }

    /// Sets the pull protocol version.
    pub fn with_pull_version(mut self, version: u64) -> Self {
        self.pull_version = Some(version);
        self
    }

    /// Checks the invariants the decoder enforces.
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.client_id.is_empty() {
            return Err(ProtocolError::EmptyClientId);
        }
        Ok(())
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes and validates a JSON request body.
    ///
    /// A missing `cookie` field is read as `null` and so resets the client's
    /// cache. Servers that only reset on an explicit `null` read a missing
    /// cookie as version 0 instead.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let raw: RawPullRequest = serde_json::from_slice(bytes)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPullRequest) -> ProtocolResult<Self> {
        let client_id = raw.client_id.ok_or(ProtocolError::MissingClientId)?;

        let cookie = match raw.cookie {
            Some(value) => Cookie::from_json(&value)?,
            None => Cookie::NONE,
        };

        let pull_version = match raw.pull_version {
            Some(value) => parse_version(&value).map_err(ProtocolError::MalformedPullVersion)?,
            None => None,
        };

        let request = Self {
            client_id,
            cookie,
            pull_version,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Pull response from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullResponse {
    /// Last mutation ID applied for the requesting client.
    #[serde(rename = "lastMutationID")]
    pub last_mutation_id: u64,
    /// New cookie (global version of the snapshot the patch was built from).
    pub cookie: Version,
    /// Cache mutations to apply, in order.
    pub patch: Patch,
}

impl PullResponse {
    /// Creates a new pull response.
    pub fn new(last_mutation_id: u64, cookie: Version, patch: Patch) -> Self {
        Self {
            last_mutation_id,
            cookie,
            patch,
        }
    }

    /// Returns true if the patch starts with `clear`.
    pub fn resets_cache(&self) -> bool {
        matches!(self.patch.first(), Some(PatchOperation::Clear))
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChangeRecord;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn decode_null_cookie() {
        let request = PullRequest::decode(br#"{"clientID":"c1","cookie":null}"#).unwrap();
        assert_eq!(request.cookie, Cookie::NONE);
        assert!(request.cookie.requests_reset());
        assert_eq!(request.cookie.baseline(), 0);
    }

    #[test]
    fn decode_zero_cookie_is_not_a_reset() {
        let request = PullRequest::decode(br#"{"clientID":"c1","cookie":0}"#).unwrap();
        assert_eq!(request.cookie, Cookie::at(0));
        assert!(!request.cookie.requests_reset());
    }

    #[test]
    fn decode_absent_cookie() {
        let request = PullRequest::decode(br#"{"clientID":"c1"}"#).unwrap();
        assert_eq!(request.cookie, Cookie::NONE);
        assert!(request.cookie.requests_reset());
    }

    #[test]
    fn decode_string_cookie() {
        let request = PullRequest::decode(br#"{"clientID":"c1","cookie":"42"}"#).unwrap();
        assert_eq!(request.cookie, Cookie::at(42));
    }

    #[test]
    fn decode_ignores_push_fields() {
        let body = json!({
            "clientID": "c1",
            "cookie": 3,
            "lastMutationID": 12,
            "schemaVersion": "",
            "pullVersion": 0
        });
        let request = PullRequest::decode(body.to_string().as_bytes()).unwrap();
        assert_eq!(request.cookie, Cookie::at(3));
        assert_eq!(request.pull_version, Some(0));
    }

    #[test]
    fn reject_malformed_cookies() {
        for cookie in [json!(-1), json!(1.5), json!("abc"), json!(""), json!("-3"), json!(true), json!([1])] {
            let body = json!({"clientID": "c1", "cookie": cookie});
            let err = PullRequest::decode(body.to_string().as_bytes()).unwrap_err();
            assert!(
                matches!(err, ProtocolError::MalformedCookie(_)),
                "cookie {cookie} gave {err:?}"
            );
        }
    }

    #[test]
    fn reject_missing_or_empty_client_id() {
        let err = PullRequest::decode(br#"{"cookie":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingClientId));

        let err = PullRequest::decode(br#"{"clientID":"","cookie":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::EmptyClientId));
    }

    #[test]
    fn reject_invalid_json() {
        let err = PullRequest::decode(b"not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));

        let err = PullRequest::decode(br#"{"clientID":7}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn request_encode_shape() {
        let request = PullRequest::new("c1", Cookie::NONE);
        let json: Value = serde_json::from_slice(&request.encode().unwrap()).unwrap();
        assert_eq!(json, json!({"clientID": "c1", "cookie": null}));

        let request = PullRequest::new("c1", Cookie::at(5)).with_pull_version(0);
        let decoded = PullRequest::decode(&request.encode().unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn response_wire_shape() {
        let record = ChangeRecord::new("a", "Jane", "hey", 1, 1);
        let response = PullResponse::new(4, 2, vec![PatchOperation::Clear, PatchOperation::put(&record)]);
        assert!(response.resets_cache());

        let json: Value = serde_json::from_slice(&response.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "lastMutationID": 4,
                "cookie": 2,
                "patch": [
                    {"op": "clear"},
                    {"op": "put", "key": "message/a", "value": {"from": "Jane", "content": "hey", "order": 1}}
                ]
            })
        );
    }

    #[test]
    fn cookie_display() {
        assert_eq!(Cookie::NONE.to_string(), "null");
        assert_eq!(Cookie::at(9).to_string(), "9");
    }

    proptest! {
        #[test]
        fn integer_and_string_cookies_agree(version in any::<u64>()) {
            let from_int = Cookie::from_json(&json!(version)).unwrap();
            let from_str = Cookie::from_json(&json!(version.to_string())).unwrap();
            prop_assert_eq!(from_int, Cookie::at(version));
            prop_assert_eq!(from_str, Cookie::at(version));
        }

        #[test]
        fn negative_cookies_rejected(version in i64::MIN..0i64) {
            prop_assert!(Cookie::from_json(&json!(version)).is_err());
        }
    }
}
