//! Seeded list data
//!
//! Stands in for the backend's list endpoints until they exist.

use chrono::{DateTime, TimeZone, Utc};

use super::records::*;

/// All lists the client can show
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub posts: Vec<CommunityPost>,
    pub essays: Vec<EssayRecord>,
    pub users: Vec<UserRecord>,
    pub transactions: Vec<Transaction>,
}

impl Catalog {
    pub fn seeded() -> Self {
        Self {
            posts: seed_posts(),
            essays: seed_essays(),
            users: seed_users(),
            transactions: seed_transactions(),
        }
    }
}

fn day(year: i32, month: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn seed_posts() -> Vec<CommunityPost> {
    vec![
        CommunityPost {
            id: "1".to_string(),
            title: "Tips for achieving Band 8 in Writing".to_string(),
            content: "Here are my top strategies that helped me achieve Band 8...".to_string(),
            author: Author {
                id: "1".to_string(),
                name: "John Doe".to_string(),
                role: "Verified Expert".to_string(),
            },
            category: PostCategory::SuccessStories,
            tags: tags(&["writing", "band8", "tips"]),
            likes: 45,
            comments: 12,
            created_at: day(2024, 2, 20),
            is_pinned: true,
        },
        CommunityPost {
            id: "2".to_string(),
            title: "How do I describe a pie chart with many small segments?".to_string(),
            content: "Should I group the smaller segments together or mention each one?"
                .to_string(),
            author: Author {
                id: "2".to_string(),
                name: "Jane Smith".to_string(),
                role: "Member".to_string(),
            },
            category: PostCategory::Questions,
            tags: tags(&["task1", "pie-chart"]),
            likes: 18,
            comments: 7,
            created_at: day(2024, 2, 22),
            is_pinned: false,
        },
        CommunityPost {
            id: "3".to_string(),
            title: "Linking words for describing trends".to_string(),
            content: "A list of cohesive devices grouped by function.".to_string(),
            author: Author {
                id: "3".to_string(),
                name: "Aziz Karimov".to_string(),
                role: "Teacher".to_string(),
            },
            category: PostCategory::Resources,
            tags: tags(&["vocabulary", "cohesion"]),
            likes: 96,
            comments: 21,
            created_at: day(2024, 2, 15),
            is_pinned: false,
        },
        CommunityPost {
            id: "4".to_string(),
            title: "Weekly Task 1 writing practice group".to_string(),
            content: "Post one essay per week and review two others.".to_string(),
            author: Author {
                id: "4".to_string(),
                name: "Maria Lopez".to_string(),
                role: "Member".to_string(),
            },
            category: PostCategory::Discussion,
            tags: tags(&["practice", "peer-review"]),
            likes: 30,
            comments: 44,
            created_at: day(2024, 2, 24),
            is_pinned: false,
        },
    ]
}

fn seed_essays() -> Vec<EssayRecord> {
    vec![
        EssayRecord {
            id: "1".to_string(),
            title: "The Impact of Technology".to_string(),
            status: EssayStatus::Reviewed,
            score: Some(7.5),
            created_at: day(2024, 2, 20),
            updated_at: day(2024, 2, 21),
            kind: EssayKind::Task2,
        },
        EssayRecord {
            id: "2".to_string(),
            title: "Household Energy Consumption 1990-2020".to_string(),
            status: EssayStatus::Reviewed,
            score: Some(6.5),
            created_at: day(2024, 2, 18),
            updated_at: day(2024, 2, 18),
            kind: EssayKind::Task1,
        },
        EssayRecord {
            id: "3".to_string(),
            title: "Coffee Production Process".to_string(),
            status: EssayStatus::Draft,
            score: None,
            created_at: day(2024, 2, 23),
            updated_at: day(2024, 2, 23),
            kind: EssayKind::Task1,
        },
        EssayRecord {
            id: "4".to_string(),
            title: "Tourist Arrivals by Region".to_string(),
            status: EssayStatus::Feedback,
            score: Some(6.0),
            created_at: day(2024, 2, 10),
            updated_at: day(2024, 2, 12),
            kind: EssayKind::Task1,
        },
    ]
}

fn seed_users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: "1".to_string(),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            status: UserStatus::Active,
            account: AccountType::Premium,
            last_active: day(2024, 2, 20),
            essays: 45,
        },
        UserRecord {
            id: "2".to_string(),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            status: UserStatus::Inactive,
            account: AccountType::Free,
            last_active: day(2024, 2, 19),
            essays: 12,
        },
    ]
}

fn seed_transactions() -> Vec<Transaction> {
    let statuses = [
        TransactionStatus::Completed,
        TransactionStatus::Completed,
        TransactionStatus::Pending,
    ];
    statuses
        .iter()
        .enumerate()
        .map(|(index, status)| Transaction {
            id: format!("#TRX-{:04}", index + 1),
            user_name: "John Doe".to_string(),
            amount_cents: 1999,
            currency: "USD".to_string(),
            description: "Subscription".to_string(),
            status: *status,
            created_at: day(2024, 2, 20 - index as u32),
        })
        .collect()
}
