//! Referral links
//!
//! Builds the invite link for a user and the share URLs for the social
//! platforms offered on the referral page.

use serde::Serialize;

const REFERRAL_BASE: &str = "https://bandup.com/signup";
const SHARE_TEXT: &str = "Join me on BandUP - The ultimate IELTS Writing preparation tool!";

/// Invite link carrying `user_id` as the referrer
pub fn referral_link(user_id: &str) -> String {
    format!("{}?ref={}", REFERRAL_BASE, urlencoding::encode(user_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePlatform {
    Twitter,
    Facebook,
    WhatsApp,
    Telegram,
}

impl SharePlatform {
    pub fn all() -> &'static [SharePlatform] {
        &[
            SharePlatform::Twitter,
            SharePlatform::Facebook,
            SharePlatform::WhatsApp,
            SharePlatform::Telegram,
        ]
    }

    /// Share URL for `link` on this platform
    pub fn share_url(&self, link: &str) -> String {
        let text = urlencoding::encode(SHARE_TEXT);
        let url = urlencoding::encode(link);
        match self {
            SharePlatform::Twitter => {
                format!("https://twitter.com/intent/tweet?text={}&url={}", text, url)
            }
            SharePlatform::Facebook => {
                format!("https://www.facebook.com/sharer/sharer.php?u={}", url)
            }
            SharePlatform::WhatsApp => {
                let combined = format!("{} {}", SHARE_TEXT, link);
                format!("https://wa.me/?text={}", urlencoding::encode(&combined))
            }
            SharePlatform::Telegram => {
                format!("https://t.me/share/url?url={}&text={}", url, text)
            }
        }
    }
}

/// A platform paired with its share URL
#[derive(Debug, Clone, Serialize)]
pub struct ShareLink {
    pub platform: SharePlatform,
    pub url: String,
}

/// Share URLs for every supported platform
pub fn share_links(user_id: &str) -> Vec<ShareLink> {
    let link = referral_link(user_id);
    SharePlatform::all()
        .iter()
        .map(|platform| ShareLink {
            platform: *platform,
            url: platform.share_url(&link),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_link() {
        assert_eq!(
            referral_link("user-abc123xyz"),
            "https://bandup.com/signup?ref=user-abc123xyz"
        );
    }

    #[test]
    fn test_share_links_are_encoded() {
        let links = share_links("user-1");
        assert_eq!(links.len(), 4);
        let facebook = links
            .iter()
            .find(|l| l.platform == SharePlatform::Facebook)
            .unwrap();
        assert_eq!(
            facebook.url,
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fbandup.com%2Fsignup%3Fref%3Duser-1"
        );
        assert!(links.iter().all(|l| !l.url.contains(' ')));
    }
}
