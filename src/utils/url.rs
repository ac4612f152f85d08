// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::Result;

/// Append path segments to a base URL, keeping any path the base already has.
///
/// # Examples
/// ```
/// use member_sync::utils::url::join;
///
/// assert_eq!(
///     join("https://example.com/blog/", &["wp-json", "wp", "v2", "users"]).unwrap(),
///     "https://example.com/blog/wp-json/wp/v2/users"
/// );
/// ```
pub fn join(base: &str, segments: &[&str]) -> Result<String> {
    let mut url = Url::parse(base)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url.to_string())
}
