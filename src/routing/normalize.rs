//! Request path → route map key.

/// Drops the query string, removes the first occurrence of `prefix` (if non-empty)
/// and trims `/` from both ends. No decoding or case folding.
pub fn normalize(raw_path: &str, prefix: &str) -> String {
    let path = raw_path.split_once('?').map_or(raw_path, |(p, _)| p);
    let path = if prefix.is_empty() {
        path.to_string()
    } else {
        path.replacen(prefix, "", 1)
    };
    path.trim_matches('/').to_string()
}
