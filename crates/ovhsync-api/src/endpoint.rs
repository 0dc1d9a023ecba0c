// ── Endpoint paths ──
//
// OVH resources are addressed by `/<collection>/{service}/<sub>/{id}` style
// paths whose segments may contain reserved characters (an IP restriction
// id is a CIDR like `203.0.113.4/32`). Segments are kept unescaped here and
// percent-encoded one by one when the final URL is built.

use std::fmt;

use url::Url;

/// A relative API path, held as individual segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    /// Start a path at the given top-level collection (e.g. `"cloud"`).
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            segments: vec![collection.into()],
        }
    }

    /// Append one segment.
    #[must_use]
    pub fn push(mut self, segment: impl fmt::Display) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// A copy of this path with one more segment.
    #[must_use]
    pub fn join(&self, segment: impl fmt::Display) -> Self {
        self.clone().push(segment)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve against an API root such as `https://eu.api.ovh.com/1.0`.
    ///
    /// Each segment is percent-encoded, so `/` inside a segment becomes `%2F`.
    pub fn to_url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            path.pop_if_empty();
            path.extend(&self.segments);
        }
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip_restriction() -> Endpoint {
        Endpoint::new("cloud")
            .push("project")
            .push("abc123")
            .push("database")
            .push("postgresql")
            .push("c1")
            .push("ipRestriction")
    }

    #[test]
    fn display_joins_raw_segments() {
        let ep = ip_restriction().push("203.0.113.4/32");
        assert_eq!(
            ep.to_string(),
            "/cloud/project/abc123/database/postgresql/c1/ipRestriction/203.0.113.4/32"
        );
    }

    #[test]
    fn to_url_escapes_each_segment() {
        let base = Url::parse("https://eu.api.ovh.com/1.0").unwrap();
        let url = ip_restriction().push("203.0.113.4/32").to_url(&base).unwrap();
        assert_eq!(
            url.path(),
            "/1.0/cloud/project/abc123/database/postgresql/c1/ipRestriction/203.0.113.4%2F32"
        );
    }

    #[test]
    fn to_url_tolerates_trailing_slash_on_base() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let url = Endpoint::new("dedicatedCloud")
            .push("pcc-1")
            .push("allowedNetwork")
            .push(42)
            .to_url(&base)
            .unwrap();
        assert_eq!(url.path(), "/dedicatedCloud/pcc-1/allowedNetwork/42");
    }

    #[test]
    fn join_leaves_original_untouched() {
        let parent = ip_restriction();
        let child = parent.join("10.0.0.0/8");
        assert_eq!(parent.segments().len(), 7);
        assert_eq!(child.segments().len(), 8);
    }
}
