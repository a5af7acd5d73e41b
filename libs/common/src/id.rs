use ulid::Ulid;

/// Generates a new ULID-based ID with the given prefix.
///
/// # Examples
/// ```
/// let id = puzzle_common::id::prefixed_ulid("pzl");
/// assert!(id.starts_with("pzl_"));
/// ```
pub fn prefixed_ulid(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string())
}

/// Returns true when `id` is `<prefix>_<ULID>` with a well-formed ULID body.
///
/// # Examples
/// ```
/// use puzzle_common::id::{is_prefixed_ulid, prefixed_ulid};
/// assert!(is_prefixed_ulid(&prefixed_ulid("pzl"), "pzl"));
/// assert!(!is_prefixed_ulid("pzl_not-a-ulid", "pzl"));
/// ```
pub fn is_prefixed_ulid(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|body| Ulid::from_string(body).is_ok())
}

/// Marker trait for types that represent a prefixed ID.
pub trait PrefixedId {
    const PREFIX: &'static str;

    fn generate() -> String {
        prefixed_ulid(Self::PREFIX)
    }

    fn is_valid(id: &str) -> bool {
        is_prefixed_ulid(id, Self::PREFIX)
    }
}

/// Well-known ID prefixes.
pub mod prefix {
    pub const USER: &str = "usr";
    pub const PUZZLE: &str = "pzl";
}
