//! Bot-mitigation page detection.

/// Lowercase markers found on Cloudflare-style interstitials.
pub const CHALLENGE_MARKERS: [&str; 5] = [
    "cf-mitigated",
    "just a moment",
    "checking your browser",
    "attention required",
    "/cdn-cgi/challenge-platform",
];

/// Returns `true` if `body` looks like a challenge page rather than content.
///
/// Matching is a case-insensitive substring test against
/// [`CHALLENGE_MARKERS`]. An occasional false positive only costs an extra
/// mirror attempt.
pub fn is_challenge(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}
