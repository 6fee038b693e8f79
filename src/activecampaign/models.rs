//! ActiveCampaign v3 response shapes (the subset of fields we use).

use pagefetch::Paginated;
use serde::{Deserialize, Deserializer, Serialize};

/// Listing metadata. ActiveCampaign sends `total` as a string, but some
/// endpoints send a number.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default, deserialize_with = "total_from_string_or_number")]
    pub total: u64,
}

fn total_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Total {
        Number(u64),
        Text(String),
        Null(Option<()>),
    }

    match Total::deserialize(deserializer)? {
        Total::Number(n) => Ok(n),
        Total::Text(s) if s.trim().is_empty() => Ok(0),
        Total::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Total::Null(_) => Ok(0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub cdate: Option<String>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    /// The tag's display name.
    pub tag: String,
    #[serde(default)]
    pub tag_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub name: String,
    /// "1" when active, "2" when inactive.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub entered: Option<String>,
    #[serde(default)]
    pub exited: Option<String>,
}

impl Automation {
    pub fn is_active(&self) -> bool {
        self.status == "1"
    }
}

/// One contact's enrollment in an automation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactAutomation {
    pub id: String,
    pub contact: String,
    /// The automation id.
    pub seriesid: String,
    /// "1" while in progress, "2" once completed.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub adddate: Option<String>,
    #[serde(default)]
    pub remdate: Option<String>,
}

impl ContactAutomation {
    pub fn is_completed(&self) -> bool {
        self.status == "2"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactTag {
    pub id: String,
    pub contact: String,
    pub tag: String,
    #[serde(default)]
    pub cdate: Option<String>,
}

macro_rules! listing_page {
    ($page:ident, $field:ident, $item:ty) => {
        #[derive(Debug, Deserialize)]
        pub struct $page {
            #[serde(default)]
            pub $field: Vec<$item>,
            #[serde(default)]
            pub meta: Meta,
        }

        impl Paginated for $page {
            type Item = $item;

            fn total(&self) -> u64 {
                self.meta.total
            }

            fn into_items(self) -> Vec<$item> {
                self.$field
            }
        }
    };
}

listing_page!(ContactsPage, contacts, Contact);
listing_page!(TagsPage, tags, Tag);
listing_page!(AutomationsPage, automations, Automation);

#[derive(Debug, Deserialize)]
pub struct ContactAutomationsPage {
    #[serde(default, rename = "contactAutomations")]
    pub contact_automations: Vec<ContactAutomation>,
    #[serde(default)]
    pub meta: Meta,
}

impl Paginated for ContactAutomationsPage {
    type Item = ContactAutomation;

    fn total(&self) -> u64 {
        self.meta.total
    }

    fn into_items(self) -> Vec<ContactAutomation> {
        self.contact_automations
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactTagsResponse {
    #[serde(default, rename = "contactTags")]
    pub contact_tags: Vec<ContactTag>,
}

#[derive(Debug, Deserialize)]
pub struct ContactTagResponse {
    #[serde(rename = "contactTag")]
    pub contact_tag: ContactTag,
}
