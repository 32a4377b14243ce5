//! Values tagged with where they came from

use fund_core::FundResult;
use serde::Serialize;
use tracing::warn;

/// Source of a [`Fetched`] value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Origin {
    /// Returned by the backend
    Live,
    /// Static fallback; `reason` is the error that caused it
    Demo { reason: String },
}

/// A value plus its origin
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            origin: Origin::Live,
        }
    }

    pub fn demo(data: T, reason: impl Into<String>) -> Self {
        Self {
            data,
            origin: Origin::Demo {
                reason: reason.into(),
            },
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.origin, Origin::Demo { .. })
    }

    /// Error that forced the fallback, if any
    pub fn demo_reason(&self) -> Option<&str> {
        match &self.origin {
            Origin::Live => None,
            Origin::Demo { reason } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            data: f(self.data),
            origin: self.origin,
        }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

/// Use the live result, or log the failure and build demo data instead
pub(crate) fn or_demo<T>(result: FundResult<T>, what: &str, demo: impl FnOnce() -> T) -> Fetched<T> {
    match result {
        Ok(data) => Fetched::live(data),
        Err(e) => {
            warn!("[FundApi] {} failed, using demo data: {}", what, e);
            Fetched::demo(demo(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fund_core::FundError;

    #[test]
    fn test_or_demo_keeps_live_value() {
        let fetched = or_demo(Ok(3), "count", || 0);
        assert_eq!(fetched, Fetched::live(3));
        assert_eq!(fetched.demo_reason(), None);
    }

    #[test]
    fn test_or_demo_records_reason() {
        let fetched = or_demo(Err(FundError::network("refused")), "count", || 7);
        assert!(fetched.is_demo());
        assert_eq!(fetched.data, 7);
        assert_eq!(fetched.demo_reason(), Some("Network error: refused"));

        let mapped = fetched.map(|n| n * 2);
        assert_eq!(mapped.data, 14);
        assert!(mapped.is_demo());
    }
}
