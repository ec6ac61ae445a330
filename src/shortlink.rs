//! Reversible recipe short links.
//!
//! A token is the recipe's primary key in lowercase hexadecimal. Nothing is
//! stored: decoding is the inverse transform, followed by a normal lookup.
//!
//! The decoder accepts bare hex digits only. Prefixed or signed forms such as
//! `0x1f`, `+1f` or `-1` are rejected rather than parsed, even where a lenient
//! integer parser would read them as a number.

/// Render a recipe id as its public token.
pub fn encode(recipe_id: i64) -> String {
    format!("{:x}", recipe_id)
}

/// Parse a public token back into a recipe id.
///
/// Returns `None` for anything that is not a plain base-16 number naming a
/// positive id, so callers can answer malformed and unknown tokens alike.
pub fn decode(token: &str) -> Option<i64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let id = u64::from_str_radix(token, 16).ok()?;
    i64::try_from(id).ok().filter(|id| *id > 0)
}
