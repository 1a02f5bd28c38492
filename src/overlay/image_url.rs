/// Hosts whose links are accepted without a file extension.
const CDN_HOSTS: &[&str] = &["cdn.discordapp.com", "media.discordapp.net"];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp"];

/// Heuristic allow-list for host-supplied image links.
///
/// A URL passes when it has an http(s) scheme and either mentions a known CDN
/// host or contains an image extension anywhere (case-insensitive), so
/// `https://x/pic.png?size=2` is accepted and so is `https://x/a.png/page`.
/// Loading failures are caught later by the image probe, not here.
pub fn is_valid_image_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    if CDN_HOSTS.iter().any(|host| url.contains(host)) {
        return true;
    }
    let lower = url.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.contains(ext))
}
