use once_cell::sync::Lazy;
use regex::Regex;

/// Crawler user-agent signatures. Lighthouse identifies itself as a bot but
/// measures streaming performance, so it is carved out: buffering for it
/// would report worse metrics than real users see.
static CRAWLER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"(?i)(bot|crawler|spider|crawling|facebookexternalhit|slurp|mediapartners-google|apis-google|headlesschrome|bingpreview|whatsapp|telegrambot|discordbot|pinterest|embedly|quora link preview|vkshare|w3c_validator)",
    )
    .expect("static crawler pattern")
});

static EXCLUDED_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)chrome-lighthouse").expect("static exclusion pattern")
});

/// Whether a user agent should receive the fully-buffered document instead
/// of a stream.
#[must_use]
pub fn is_crawler(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent else {
        return false;
    };
    !EXCLUDED_RE.is_match(ua) && CRAWLER_RE.is_match(ua)
}
