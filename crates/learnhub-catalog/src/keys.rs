use std::fmt;

/// Literal key of the aggregate course listing.
pub const AGGREGATE_KEY: &str = "allCourses";

const COURSE_PREFIX: &str = "course:";

/// Catalog cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A single course.
    Course(String),
    /// The listing of every course.
    AllCourses,
}

impl CacheKey {
    /// Key for one course.
    #[must_use]
    pub fn course(id: impl Into<String>) -> Self {
        Self::Course(id.into())
    }

    /// Store key string.
    #[must_use]
    pub fn to_key(&self) -> String {
        match self {
            Self::Course(id) => format!("{COURSE_PREFIX}{id}"),
            Self::AllCourses => AGGREGATE_KEY.to_string(),
        }
    }

    /// Parses a store key string.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == AGGREGATE_KEY {
            return Some(Self::AllCourses);
        }
        raw.strip_prefix(COURSE_PREFIX)
            .filter(|id| !id.is_empty())
            .map(Self::course)
    }

    /// Returns `true` for the aggregate key.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::AllCourses)
    }

    /// Keys a mutation of course `id` must invalidate.
    #[must_use]
    pub fn affected_by(id: &str) -> [Self; 2] {
        [Self::course(id), Self::AllCourses]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(id) => write!(f, "{COURSE_PREFIX}{id}"),
            Self::AllCourses => f.write_str(AGGREGATE_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_strings() {
        assert_eq!(CacheKey::course("42").to_key(), "course:42");
        assert_eq!(CacheKey::AllCourses.to_key(), "allCourses");
        assert_eq!(CacheKey::course("42").to_string(), "course:42");
    }

    #[test]
    fn test_parse() {
        assert_eq!(CacheKey::parse("allCourses"), Some(CacheKey::AllCourses));
        assert_eq!(CacheKey::parse("course:7"), Some(CacheKey::course("7")));
        assert_eq!(CacheKey::parse("course:"), None);
        assert_eq!(CacheKey::parse("u1"), None);
    }

    #[test]
    fn test_mutation_touches_both_keys() {
        let keys = CacheKey::affected_by("7");
        assert!(keys.contains(&CacheKey::course("7")));
        assert!(keys.contains(&CacheKey::AllCourses));
    }
}
