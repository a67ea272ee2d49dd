//! Campaign attribution from UTM query parameters

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// UTM parameters of the page URL. Only produced when `utm_source` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub utm_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
}

impl Campaign {
    pub fn from_href(href: &str) -> Result<Option<Self>> {
        let url = Url::parse(href)?;
        Ok(Self::from_url(&url))
    }

    pub fn from_url(url: &Url) -> Option<Self> {
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Some(Self {
            utm_source: param("utm_source")?,
            utm_medium: param("utm_medium"),
            utm_campaign: param("utm_campaign"),
            utm_term: param("utm_term"),
            utm_content: param("utm_content"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DescriptorError;

    #[test]
    fn test_reads_utm_parameters() {
        let campaign = Campaign::from_href(
            "https://example.com/pricing?utm_source=newsletter&utm_medium=email&utm_campaign=spring%20sale",
        )
        .unwrap()
        .unwrap();

        assert_eq!(campaign.utm_source, "newsletter");
        assert_eq!(campaign.utm_medium.as_deref(), Some("email"));
        assert_eq!(campaign.utm_campaign.as_deref(), Some("spring sale"));
        assert_eq!(campaign.utm_term, None);
        assert_eq!(campaign.utm_content, None);
    }

    #[test]
    fn test_requires_source() {
        assert_eq!(
            Campaign::from_href("https://example.com/?utm_medium=email").unwrap(),
            None
        );
        assert_eq!(
            Campaign::from_href("https://example.com/?utm_source=").unwrap(),
            None
        );
        assert_eq!(Campaign::from_href("https://example.com/").unwrap(), None);
    }

    #[test]
    fn test_rejects_relative_href() {
        assert!(matches!(
            Campaign::from_href("/relative/path"),
            Err(DescriptorError::InvalidUrl(_))
        ));
    }
}
