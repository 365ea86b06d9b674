use serde::{Deserialize, Serialize};

const SOCIAL_HOSTS: [&str; 5] = [
    "instagram.com",
    "youtube.com",
    "tiktok.com",
    "facebook.com",
    "twitter.com",
];

/// How an ad's content can be watched. Decided once when the ad is ingested.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdKind {
    /// Media the client can stream and measure progress on.
    Video { url: String },
    /// Social-media hosted content that can only be opened externally.
    External { url: String },
    Unavailable,
}

impl AdKind {
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() {
            return AdKind::Unavailable;
        }

        let host = url::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase));
        let is_social = match host {
            Some(host) => SOCIAL_HOSTS
                .iter()
                .any(|social| host == *social || host.ends_with(&format!(".{}", social))),
            None => SOCIAL_HOSTS.iter().any(|social| url.contains(social)),
        };

        if is_social {
            AdKind::External {
                url: url.to_string(),
            }
        } else {
            AdKind::Video {
                url: url.to_string(),
            }
        }
    }
}

/// Ad as listed by `GET /ads`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Ad {
    pub id: String,
    pub name: String,
    pub kind: AdKind,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub duration_secs: u32,
}

impl From<AdRecord> for Ad {
    fn from(record: AdRecord) -> Self {
        Ad {
            kind: AdKind::from_url(&record.video_url),
            id: record.id,
            name: record.name,
            image_url: record.image_url,
            link: record.link,
            duration_secs: record.duration,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_ads: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<AdsData>,
}

#[derive(Debug, Deserialize)]
pub struct AdsData {
    pub ads: Vec<AdRecord>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdsPage {
    pub ads: Vec<Ad>,
    pub pagination: Pagination,
}
