use crate::error::{EblocError, Result};
use std::collections::BTreeMap;

/// Cookie carrying the selected association
const ACCOUNT_COOKIE: &str = "asoc-cur";

/// Cookie carrying `<association>_<apartment>` for the selected unit
const UNIT_COOKIE: &str = "home-ap-cur";

/// Session cookie plus the identifiers embedded in it
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    cookie: String,
    account_id: Option<String>,
    unit_id: Option<String>,
}

impl SessionCredentials {
    /// Parse identifiers out of a raw `Cookie` header value
    pub fn parse(cookie: &str) -> Self {
        let cookie = cookie.trim().to_string();
        let parts = cookie_pairs(&cookie);

        let account_id = parts
            .get(ACCOUNT_COOKIE)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string());
        let unit_id = parts
            .get(UNIT_COOKIE)
            .and_then(|v| v.split_once('_'))
            .map(|(_, unit)| unit.trim())
            .filter(|unit| !unit.is_empty())
            .map(str::to_string);

        Self {
            cookie,
            account_id,
            unit_id,
        }
    }

    /// Raw cookie header value
    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    /// Association identifier (`pIdAsoc`), if present
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// Apartment identifier (`pIdAp`), if present
    pub fn unit_id(&self) -> Option<&str> {
        self.unit_id.as_deref()
    }

    /// Association identifier, or an auth error when the cookie lacks it
    pub fn require_account_id(&self) -> Result<&str> {
        self.account_id()
            .ok_or_else(|| EblocError::auth(format!("Invalid cookie: missing {}", ACCOUNT_COOKIE)))
    }

    pub fn is_valid(&self) -> bool {
        self.account_id.is_some()
    }
}

// The cookie is a credential; keep it out of debug output
impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("cookie", &"***")
            .field("account_id", &self.account_id)
            .field("unit_id", &self.unit_id)
            .finish()
    }
}

fn cookie_pairs(cookie: &str) -> BTreeMap<&str, &str> {
    cookie
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_account_and_unit() {
        let s = SessionCredentials::parse(
            " PHPSESSID=abc; asoc-cur=4521 ; home-ap-cur=4521_17; lang=ro ",
        );
        assert_eq!(s.account_id(), Some("4521"));
        assert_eq!(s.unit_id(), Some("17"));
        assert!(s.is_valid());
        assert_eq!(
            s.cookie(),
            "PHPSESSID=abc; asoc-cur=4521 ; home-ap-cur=4521_17; lang=ro"
        );
    }

    #[test]
    fn unit_requires_underscore_suffix() {
        let s = SessionCredentials::parse("asoc-cur=1; home-ap-cur=17");
        assert_eq!(s.unit_id(), None);
        let s = SessionCredentials::parse("asoc-cur=1; home-ap-cur=1_");
        assert_eq!(s.unit_id(), None);
    }

    #[test]
    fn missing_or_empty_account_is_invalid() {
        for cookie in ["", "PHPSESSID=abc", "asoc-cur=; home-ap-cur=1_2"] {
            let s = SessionCredentials::parse(cookie);
            assert!(!s.is_valid(), "{cookie}");
            let err = s.require_account_id().unwrap_err();
            assert!(err.is_auth());
        }
    }

    #[test]
    fn debug_output_hides_cookie() {
        let s = SessionCredentials::parse("asoc-cur=9; PHPSESSID=topsecret");
        let shown = format!("{:?}", s);
        assert!(!shown.contains("topsecret"));
        assert!(shown.contains("\"9\""));
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let s = SessionCredentials::parse("token=a=b; asoc-cur=3");
        assert_eq!(s.account_id(), Some("3"));
    }
}
