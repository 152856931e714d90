//! Generation and recovery of attachment storage keys.

use std::path::Path;

use time::OffsetDateTime;
use uuid::Uuid;

/// Generate a unique storage key for an uploaded attachment.
///
/// The key combines the current time in milliseconds with a random UUID, so
/// concurrent uploads within the same clock tick cannot collide. The
/// original filename contributes only its extension, which downstream
/// consumers use for content-type inference.
pub fn generate_attachment_key(original_name: &str) -> String {
    let timestamp = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let token = Uuid::new_v4().simple();

    match Path::new(original_name)
        .extension()
        .and_then(|extension| extension.to_str())
    {
        Some(extension) if !extension.is_empty() => format!("{timestamp}-{token}.{extension}"),
        _ => format!("{timestamp}-{token}"),
    }
}

/// Recover the storage key from a public attachment URL.
///
/// Keys never contain `/`, so the key is the URL's final path segment.
pub fn key_from_public_url(url: &str) -> Option<&str> {
    match url.rsplit('/').next() {
        Some(key) if !key.is_empty() => Some(key),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{generate_attachment_key, key_from_public_url};

    #[test]
    fn keys_are_unique_across_many_concurrent_calls() {
        let handles: Vec<_> = (0..8)
            .map(|thread| {
                std::thread::spawn(move || {
                    (0..1_250)
                        .map(|i| generate_attachment_key(&format!("receipt {thread}-{i}.jpg")))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut keys = HashSet::new();
        for handle in handles {
            for key in handle.join().expect("key generation thread panicked") {
                assert!(keys.insert(key.clone()), "duplicate key generated: {key}");
            }
        }

        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn key_preserves_extension() {
        let key = generate_attachment_key("invoice.PNG");

        assert!(key.ends_with(".PNG"), "got key {key}, want a .PNG suffix");
    }

    #[test]
    fn key_without_extension_has_no_suffix() {
        let key = generate_attachment_key("receipt");

        assert!(!key.contains('.'), "got key {key}, want no extension");
    }

    #[test]
    fn key_for_empty_name() {
        let key = generate_attachment_key("");

        assert!(!key.is_empty());
        assert!(!key.contains('.'));
    }

    #[test]
    fn key_recovered_from_public_url() {
        let key = generate_attachment_key("photo.jpg");
        let url = format!("/attachments/{key}");

        assert_eq!(key_from_public_url(&url), Some(key.as_str()));
    }

    #[test]
    fn key_from_url_with_trailing_slash_is_none() {
        assert_eq!(key_from_public_url("/attachments/"), None);
    }
}
