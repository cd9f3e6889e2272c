//! Static fixture datasets backing sandbox-mode tool nodes.
//!
//! Lookups return owned copies so callers can never mutate the fixtures.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub tier: String,
    pub mrr: u32,
    pub status: String,
    pub health_score: u32,
    pub renewal_date: String,
    pub contact_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub id: String,
    pub customer_id: String,
    pub subject: String,
    pub status: String,
    pub priority: String,
    pub created: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmFilters {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub min_health_score: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketFilters {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

fn search_result(title: &str, snippet: &str, url: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        snippet: snippet.to_string(),
        url: url.to_string(),
    }
}

static WEB_SEARCH_DATA: Lazy<Vec<(&'static str, Vec<SearchResult>)>> = Lazy::new(|| {
    vec![
        (
            "customer retention strategies",
            vec![
                search_result(
                    "Top 10 Customer Retention Strategies for 2024",
                    "Implement loyalty programs, personalized communication, and proactive support to retain customers...",
                    "https://example.com/retention-strategies",
                ),
                search_result(
                    "The Complete Guide to Customer Success",
                    "Customer success teams can reduce churn by 15-25% through regular check-ins and value delivery...",
                    "https://example.com/customer-success",
                ),
            ],
        ),
        (
            "product pricing models",
            vec![search_result(
                "SaaS Pricing Models Explained",
                "Explore flat-rate, usage-based, tiered, and per-user pricing strategies...",
                "https://example.com/pricing-models",
            )],
        ),
        (
            "ai agent frameworks",
            vec![search_result(
                "Building Production AI Agents",
                "Learn about ReAct, Plan-and-Execute, and multi-agent orchestration patterns...",
                "https://example.com/ai-agents",
            )],
        ),
    ]
});

static DEFAULT_SEARCH_RESULTS: Lazy<Vec<SearchResult>> = Lazy::new(|| {
    vec![search_result(
        "Search Results",
        "Information about your search query...",
        "https://example.com/search",
    )]
});

static CRM_DATA: Lazy<Vec<CustomerRecord>> = Lazy::new(|| {
    vec![
        CustomerRecord {
            id: "CUST-001".to_string(),
            name: "Acme Corp".to_string(),
            tier: "Enterprise".to_string(),
            mrr: 5000,
            status: "active".to_string(),
            health_score: 85,
            renewal_date: "2024-06-15".to_string(),
            contact_email: "john@acme.com".to_string(),
        },
        CustomerRecord {
            id: "CUST-002".to_string(),
            name: "TechStart Inc".to_string(),
            tier: "Pro".to_string(),
            mrr: 500,
            status: "at-risk".to_string(),
            health_score: 45,
            renewal_date: "2024-03-20".to_string(),
            contact_email: "sarah@techstart.com".to_string(),
        },
        CustomerRecord {
            id: "CUST-003".to_string(),
            name: "Global Systems".to_string(),
            tier: "Enterprise".to_string(),
            mrr: 8000,
            status: "active".to_string(),
            health_score: 92,
            renewal_date: "2024-09-01".to_string(),
            contact_email: "mike@globalsystems.com".to_string(),
        },
    ]
});

static TICKET_DATA: Lazy<Vec<TicketRecord>> = Lazy::new(|| {
    vec![
        TicketRecord {
            id: "TICK-101".to_string(),
            customer_id: "CUST-002".to_string(),
            subject: "Feature request: Dark mode".to_string(),
            status: "open".to_string(),
            priority: "medium".to_string(),
            created: "2024-01-15T10:30:00Z".to_string(),
            description: "Users are requesting a dark mode option for better accessibility.".to_string(),
        },
        TicketRecord {
            id: "TICK-102".to_string(),
            customer_id: "CUST-002".to_string(),
            subject: "Login issues on mobile app".to_string(),
            status: "in-progress".to_string(),
            priority: "high".to_string(),
            created: "2024-01-18T14:20:00Z".to_string(),
            description: "Multiple users reporting authentication failures on iOS app.".to_string(),
        },
        TicketRecord {
            id: "TICK-103".to_string(),
            customer_id: "CUST-001".to_string(),
            subject: "API rate limit increase".to_string(),
            status: "resolved".to_string(),
            priority: "low".to_string(),
            created: "2024-01-10T09:00:00Z".to_string(),
            description: "Customer needs higher API limits for integration.".to_string(),
        },
    ]
});

/// Keyword-matched web search over the fixture table. Falls back to a
/// default result set, so the result is never empty.
pub fn sim_web_search(query: &str) -> Vec<SearchResult> {
    let lower = query.to_lowercase();
    for (keyword, results) in WEB_SEARCH_DATA.iter() {
        if lower.contains(keyword) {
            return results.clone();
        }
    }
    DEFAULT_SEARCH_RESULTS.clone()
}

pub fn sim_crm_query(filters: Option<&CrmFilters>) -> Vec<CustomerRecord> {
    let mut results: Vec<CustomerRecord> = CRM_DATA.clone();
    if let Some(filters) = filters {
        if let Some(status) = &filters.status {
            results.retain(|c| &c.status == status);
        }
        if let Some(tier) = &filters.tier {
            results.retain(|c| &c.tier == tier);
        }
        if let Some(min_health_score) = filters.min_health_score {
            results.retain(|c| c.health_score >= min_health_score);
        }
    }
    results
}

pub fn sim_ticket_query(filters: Option<&TicketFilters>) -> Vec<TicketRecord> {
    let mut results: Vec<TicketRecord> = TICKET_DATA.clone();
    if let Some(filters) = filters {
        if let Some(customer_id) = &filters.customer_id {
            results.retain(|t| &t.customer_id == customer_id);
        }
        if let Some(status) = &filters.status {
            results.retain(|t| &t.status == status);
        }
        if let Some(priority) = &filters.priority {
            results.retain(|t| &t.priority == priority);
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_search_never_returns_empty() {
        assert!(!sim_web_search("something nobody indexed").is_empty());
        assert_eq!(sim_web_search("best customer retention strategies today").len(), 2);
    }

    #[test]
    fn crm_query_filters_compose() {
        let filters = CrmFilters {
            tier: Some("Enterprise".to_string()),
            min_health_score: Some(90),
            ..Default::default()
        };
        let results = sim_crm_query(Some(&filters));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Global Systems");
    }

    #[test]
    fn lookups_return_independent_copies() {
        let mut first = sim_crm_query(None);
        first.clear();
        assert_eq!(sim_crm_query(None).len(), 3);
    }
}
