//! Session identity and share links.
//!
//! A hosted session is named by a random [`SessionId`]. The id travels in a
//! single `join` query parameter on the page locator; nothing else about a
//! session is persisted or shared.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use streamscribe_common::error::{ScribeError, ScribeResult};
use url::Url;

/// Query parameter carrying the session identifier.
pub const JOIN_PARAM: &str = "join";

/// Opaque identifier of one hosted capture session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh identifier (random UUID v4).
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received from elsewhere. Empty ids are rejected.
    pub fn new(raw: impl Into<String>) -> ScribeResult<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ScribeError::invalid_link("session identifier is empty"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = ScribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = ScribeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parse an absolute page locator.
pub fn parse_link(link: &str) -> ScribeResult<Url> {
    Url::parse(link.trim()).map_err(|e| ScribeError::invalid_link(format!("{link:?}: {e}")))
}

/// Builds share links on top of a base page locator and reads them back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCodec {
    base: Url,
}

impl LinkCodec {
    pub fn new(base: &str) -> ScribeResult<Self> {
        Ok(Self::from_url(parse_link(base)?))
    }

    pub fn from_url(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Share link for `id`, or an empty string when there is no session.
    ///
    /// An existing `join` parameter on the base locator is replaced in
    /// place; all other parameters and the fragment are kept.
    pub fn encode(&self, id: Option<&SessionId>) -> String {
        let Some(id) = id else {
            return String::new();
        };

        let mut url = self.base.clone();
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let mut replaced = false;
        pairs.retain_mut(|(key, value)| {
            if key != JOIN_PARAM {
                return true;
            }
            if replaced {
                return false;
            }
            *value = id.to_string();
            replaced = true;
            true
        });
        if !replaced {
            pairs.push((JOIN_PARAM.to_string(), id.to_string()));
        }

        url.query_pairs_mut().clear().extend_pairs(pairs);
        url.to_string()
    }

    /// Session identifier carried by `url`: the first non-empty `join` value.
    pub fn decode(url: &Url) -> Option<SessionId> {
        url.query_pairs()
            .filter(|(key, _)| key == JOIN_PARAM)
            .find_map(|(_, value)| SessionId::new(value.into_owned()).ok())
    }

    /// Parse `link` and return its session identifier, if any.
    pub fn decode_str(link: &str) -> ScribeResult<Option<SessionId>> {
        Ok(Self::decode(&parse_link(link)?))
    }

    /// Accept either a full share link or a bare identifier.
    pub fn identifier_from_input(input: &str) -> ScribeResult<SessionId> {
        let input = input.trim();
        match parse_link(input) {
            Ok(url) => Self::decode(&url).ok_or_else(|| {
                ScribeError::invalid_link(format!("{input:?} has no {JOIN_PARAM} parameter"))
            }),
            Err(_) => SessionId::new(input),
        }
    }
}
