//! Path patterns for policy documents
//!
//! A pattern is a `/`-delimited list of segments. A segment of exactly `*`
//! matches that segment and everything after it; any other segment must equal
//! the request segment (surrounding whitespace ignored). One leading and one
//! trailing `/` are ignored on both sides.

/// Segment that matches the remainder of a path
pub const WILDCARD: &str = "*";

/// Compiled path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<String>,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Self {
        PathPattern {
            source: pattern.to_string(),
            segments: split(pattern).map(str::to_string).collect(),
        }
    }

    /// Pattern as declared
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check whether a request path falls under this pattern
    ///
    /// # Examples
    /// ```
    /// use rubac::workflow::PathPattern;
    ///
    /// assert!(PathPattern::new("admin/*").matches("/admin/users/bob"));
    /// assert!(PathPattern::new("/admin/w1/").matches("admin/w1"));
    /// assert!(!PathPattern::new("admin/users").matches("admin/other"));
    /// ```
    pub fn matches(&self, path: &str) -> bool {
        let request: Vec<&str> = split(path).collect();

        for (i, segment) in self.segments.iter().enumerate() {
            if segment == WILDCARD {
                return true;
            }
            match request.get(i) {
                Some(actual) if *actual == segment => continue,
                _ => return false,
            }
        }

        request.len() == self.segments.len()
    }
}

/// Strip one leading and one trailing slash
fn normalize(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.strip_suffix('/').unwrap_or(path)
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    normalize(path).split('/').map(str::trim)
}
