//! Public URLs for objects in the hosted storage buckets.

/// Public URL of `path` inside `bucket`.
pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{}/{}",
        base_url.trim_end_matches('/'),
        bucket.trim_matches('/'),
        path.trim_start_matches('/'),
    )
}

/// Turn an image reference into a URL the backend can fetch.
///
/// `http(s)` URLs pass through; anything else is read as an object path in
/// `bucket`.
pub fn resolve_image_ref(base_url: &str, bucket: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.starts_with("http://") || reference.starts_with("https://") {
        reference.to_string()
    } else {
        public_object_url(base_url, bucket, reference)
    }
}
