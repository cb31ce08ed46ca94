//! Records shown in list views
//!
//! - `CommunityPost`: a forum post, filtered by category
//! - `EssayRecord`: an entry of "My Essays", filtered by status and kind
//! - `UserRecord`: an account in the admin user table
//! - `Transaction`: a payment in the admin revenue table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Faceted, Listable};

/// Error for facet names that are not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownFacet {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a facet enum with its wire names
macro_rules! facet_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownFacet;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(UnknownFacet {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

facet_enum!(
    /// Community board sections
    PostCategory, "category" {
        Discussion => "discussion",
        Questions => "questions",
        Resources => "resources",
        SuccessStories => "success-stories",
    }
);

facet_enum!(
    /// Lifecycle of a saved essay
    EssayStatus, "essay status" {
        Draft => "draft",
        Submitted => "submitted",
        Reviewed => "reviewed",
        Feedback => "feedback",
    }
);

facet_enum!(
    EssayKind, "essay type" {
        Task1 => "task1",
        Task2 => "task2",
    }
);

facet_enum!(
    UserStatus, "user status" {
        Active => "active",
        Inactive => "inactive",
    }
);

facet_enum!(
    AccountType, "account type" {
        Free => "free",
        Premium => "premium",
    }
);

facet_enum!(
    TransactionStatus, "transaction status" {
        Completed => "completed",
        Pending => "pending",
        Failed => "failed",
        Refunded => "refunded",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub category: PostCategory,
    pub tags: Vec<String>,
    pub likes: u64,
    pub comments: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Listable for CommunityPost {
    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.likes
    }

    fn is_pinned(&self) -> bool {
        self.is_pinned
    }
}

impl Faceted<PostCategory> for CommunityPost {
    fn has_facet(&self, facet: &PostCategory) -> bool {
        self.category == *facet
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EssayRecord {
    pub id: String,
    pub title: String,
    pub status: EssayStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EssayKind,
}

/// Either facet of an essay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EssayFacet {
    Status(EssayStatus),
    Kind(EssayKind),
}

impl Listable for EssayRecord {
    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Faceted<EssayFacet> for EssayRecord {
    fn has_facet(&self, facet: &EssayFacet) -> bool {
        match facet {
            EssayFacet::Status(status) => self.status == *status,
            EssayFacet::Kind(kind) => self.kind == *kind,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: UserStatus,
    #[serde(rename = "type")]
    pub account: AccountType,
    pub last_active: DateTime<Utc>,
    pub essays: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFacet {
    Status(UserStatus),
    Account(AccountType),
}

impl Listable for UserRecord {
    fn title(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.last_active
    }

    fn popularity(&self) -> u64 {
        self.essays
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.email.to_lowercase().contains(needle)
    }
}

impl Faceted<UserFacet> for UserRecord {
    fn has_facet(&self, facet: &UserFacet) -> bool {
        match facet {
            UserFacet::Status(status) => self.status == *status,
            UserFacet::Account(account) => self.account == *account,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Display id, e.g. `#TRX-0001`
    pub id: String,
    pub user_name: String,
    /// Amount in the smallest currency unit
    pub amount_cents: u64,
    pub currency: String,
    pub description: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Listable for Transaction {
    fn title(&self) -> &str {
        &self.user_name
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn popularity(&self) -> u64 {
        self.amount_cents
    }

    fn matches_text(&self, needle: &str) -> bool {
        self.user_name.to_lowercase().contains(needle) || self.id.to_lowercase().contains(needle)
    }
}

impl Faceted<TransactionStatus> for Transaction {
    fn has_facet(&self, facet: &TransactionStatus) -> bool {
        self.status == *facet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_round_trip_names() {
        assert_eq!(
            "success-stories".parse::<PostCategory>().unwrap(),
            PostCategory::SuccessStories
        );
        assert_eq!(EssayKind::Task1.to_string(), "task1");
        assert_eq!(TransactionStatus::all().len(), 4);
    }

    #[test]
    fn test_unknown_facet() {
        let err = "archived".parse::<EssayStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown essay status 'archived'");
    }

    #[test]
    fn test_essay_record_serializes_type_field() {
        let record = EssayRecord {
            id: "1".to_string(),
            title: "The Impact of Technology".to_string(),
            status: EssayStatus::Reviewed,
            score: Some(7.5),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            kind: EssayKind::Task2,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "task2");
        assert_eq!(json["status"], "reviewed");
    }
}
