//! Follow-up question suggestions.
//!
//! Derived from whatever filters the current question carried, so the chat
//! UI can offer a next step that stays on topic. Capped at four.

use crate::models::EarmarkFilters;

/// Built-in starter questions for an empty chat, served by `GET /examples`.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "Show me earmarks from the Department of Education in 2022",
    "What are the largest earmarks over $1 million?",
    "Which agencies received the most funding in 2023?",
    "Show me earmarks for healthcare projects",
    "Who requested the most earmarks in California?",
    "Compare funding between Department of Labor and Department of Transportation",
    "What was the total amount allocated to rural development?",
    "Show me the smallest earmarks under $100,000",
];

const MAX_SUGGESTIONS: usize = 4;

/// Builds follow-up suggestions from the question's filter focus and
/// whether it matched anything.
pub fn follow_ups(filters: &EarmarkFilters, result_count: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    if result_count == 0 {
        out.push("Try a broader search with fewer filters".to_string());
        out.push("Show me general examples in this category".to_string());
    }

    if let Some(ref agency) = filters.agency {
        out.push(format!(
            "Show trends for the Department of {} over time",
            agency
        ));
        out.push(format!(
            "Compare the Department of {} with similar agencies",
            agency
        ));
    }

    if let Some(ref member) = filters.member {
        out.push(format!("What other projects did {} request?", member));
    }

    if let Some(year) = filters.year {
        out.push(format!("How does {} compare with {}?", year, year - 1));
    }

    if out.is_empty() {
        out.push("What are the largest earmarks over $1 million?".to_string());
        out.push("Which agencies received the most funding?".to_string());
    }

    out.truncate(MAX_SUGGESTIONS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agency_focus() {
        let filters = EarmarkFilters {
            agency: Some("Labor".to_string()),
            ..Default::default()
        };
        let out = follow_ups(&filters, 12);
        assert!(out[0].contains("Department of Labor"));
        assert!(out.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn test_zero_results_suggests_broadening() {
        let filters = EarmarkFilters {
            agency: Some("Labor".to_string()),
            year: Some(2022),
            member: Some("Collins".to_string()),
            ..Default::default()
        };
        let out = follow_ups(&filters, 0);
        assert_eq!(out[0], "Try a broader search with fewer filters");
        assert_eq!(out.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_no_focus_falls_back_to_generic() {
        let out = follow_ups(&EarmarkFilters::default(), 5);
        assert!(!out.is_empty());
        assert!(out[0].contains("largest earmarks"));
    }
}
