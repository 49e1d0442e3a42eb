//! Regex entity extraction from natural-language questions.
//!
//! Pulls the structured filters an earmark question can carry: a member of
//! Congress ("Sen. Collins"), a fiscal year ("FY 2022", "in 2023"), an agency
//! ("Department of Labor", "HUD Department"), and dollar bounds ("over $2.5
//! million", "under 750,000"). Whatever text remains after the matched spans
//! are removed becomes the keyword residue used for text-column matching.

use anyhow::Result;
use regex::Regex;

use crate::models::EarmarkFilters;

/// Words too generic to be useful as keywords against the earmarks table.
const STOPWORDS: &[&str] = &[
    "projects",
    "earmarks",
    "funding",
    "funded",
    "department",
    "earmark",
    "of",
    "the",
    "and",
    "in",
    "for",
    "on",
    "show",
    "what",
    "which",
    "were",
    "from",
];

/// Tokens that terminate a greedy agency capture ("Department of Labor in
/// 2022" should yield agency "Labor", not "Labor in 2022"). "and" is handled
/// separately since agency names contain it ("Housing and Urban Development").
const AGENCY_BOUNDARY: &[&str] = &[
    "in", "for", "during", "over", "under", "above", "below", "from", "with", "between",
];

pub struct Extractor {
    member_re: Regex,
    year_re: Regex,
    dept_of_re: Regex,
    acronym_re: Regex,
    over_re: Regex,
    under_re: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            member_re: Regex::new(
                r"(?i)\b(?:Sen(?:ator)?|Rep(?:resentative)?|Congress(?:man|woman)?)\.?\s+([\w'-]+)",
            )?,
            year_re: Regex::new(r"(?i)\b(?:FY\s*)?(20\d{2})\b")?,
            dept_of_re: Regex::new(r"(?i)\b(?:U\.?S\.?\s+)?(?:Department|Dept\.?)\s+of\s+([\w\s&]+)")?,
            acronym_re: Regex::new(r"\b([A-Z]{2,})\b\s+[Dd]epartment")?,
            over_re: Regex::new(r"(?i)(?:over|above|greater than)\s+\$?([\d.,]+\s*(?:m(?:illion)?)?)")?,
            under_re: Regex::new(r"(?i)(?:under|below|less than)\s+\$?([\d.,]+\s*(?:m(?:illion)?)?)")?,
        })
    }

    /// Extracts all recognizable entities from a question.
    pub fn extract(&self, question: &str) -> EarmarkFilters {
        let mut consumed: Vec<(usize, usize)> = Vec::new();

        let member = self.member_re.captures(question).map(|c| {
            consumed.push(span(&c, 0));
            c[1].to_string()
        });

        let year = self.year_re.captures(question).and_then(|c| {
            consumed.push(span(&c, 0));
            c[1].parse::<i64>().ok()
        });

        let agency = self
            .dept_of_re
            .captures(question)
            .map(|c| {
                consumed.push(span(&c, 0));
                trim_agency(&c[1])
            })
            .or_else(|| {
                self.acronym_re.captures(question).map(|c| {
                    consumed.push(span(&c, 0));
                    c[1].to_string()
                })
            })
            .filter(|a| !a.is_empty());

        let min_amount = self.over_re.captures(question).map(|c| {
            consumed.push(span(&c, 0));
            parse_dollars(&c[1])
        });

        let max_amount = self.under_re.captures(question).map(|c| {
            consumed.push(span(&c, 0));
            parse_dollars(&c[1])
        });

        let keywords = keyword_residue(question, &consumed);

        EarmarkFilters {
            member,
            year,
            agency,
            min_amount,
            max_amount,
            keywords,
        }
    }
}

fn span(caps: &regex::Captures, group: usize) -> (usize, usize) {
    let m = caps.get(group).map(|m| (m.start(), m.end()));
    m.unwrap_or((0, 0))
}

/// "5,000" → 5000.0; "2.5" → 2.5; "3m" and "3 million" → 3_000_000.0.
pub fn parse_dollars(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let n: f64 = cleaned.parse().unwrap_or(0.0);
    let lower = raw.to_ascii_lowercase();
    if lower.contains('m') {
        n * 1_000_000.0
    } else {
        n
    }
}

/// The "Department of ..." capture is greedy over word characters and spaces,
/// so it swallows trailing clauses. Cut at the first boundary token or year.
/// An "and" stays when it joins name parts ("Housing and Urban Development")
/// but ends the capture when it introduces another clause or department.
fn trim_agency(raw: &str) -> String {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let lower = token.to_ascii_lowercase();
        if token.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        if lower == "and" {
            let next = tokens.get(i + 1).map(|t| t.to_ascii_lowercase());
            let ends_name = match next.as_deref() {
                None | Some("department") | Some("dept") => true,
                Some(n) => {
                    AGENCY_BOUNDARY.contains(&n) || n.chars().all(|c| c.is_ascii_digit())
                }
            };
            if ends_name {
                break;
            }
            kept.push(token);
            continue;
        }
        if AGENCY_BOUNDARY.contains(&lower.as_str()) {
            break;
        }
        kept.push(token);
    }
    kept.join(" ")
}

/// Removes consumed entity spans, then keeps lowercase tokens longer than
/// three characters that are not stopwords.
fn keyword_residue(question: &str, consumed: &[(usize, usize)]) -> Vec<String> {
    let mut cleaned = String::with_capacity(question.len());
    for (i, ch) in question.char_indices() {
        let inside = consumed
            .iter()
            .any(|&(start, end)| start != end && i >= start && i < end);
        if inside {
            cleaned.push(' ');
        } else {
            cleaned.push(ch);
        }
    }

    cleaned
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(question: &str) -> EarmarkFilters {
        Extractor::new().unwrap().extract(question)
    }

    #[test]
    fn test_member_titles() {
        assert_eq!(
            extract("What did Sen. Collins request?").member.as_deref(),
            Some("Collins")
        );
        assert_eq!(
            extract("earmarks from Senator Murray").member.as_deref(),
            Some("Murray")
        );
        assert_eq!(
            extract("Rep O'Halleran projects").member.as_deref(),
            Some("O'Halleran")
        );
        assert_eq!(
            extract("Congresswoman Kaptur funding").member.as_deref(),
            Some("Kaptur")
        );
        assert_eq!(extract("earmarks in Maine").member, None);
    }

    #[test]
    fn test_year_with_and_without_fy_prefix() {
        assert_eq!(extract("projects in FY 2022").year, Some(2022));
        assert_eq!(extract("projects in FY2023").year, Some(2023));
        assert_eq!(extract("funding in 2021").year, Some(2021));
        assert_eq!(extract("the 1998 budget").year, None);
    }

    #[test]
    fn test_agency_department_of() {
        assert_eq!(
            extract("Department of Labor earmarks").agency.as_deref(),
            Some("Labor")
        );
        assert_eq!(
            extract("U.S. Department of Health & Human Services grants")
                .agency
                .as_deref(),
            Some("Health & Human Services grants")
        );
        assert_eq!(
            extract("Dept. of Transportation projects in Ohio")
                .agency
                .as_deref(),
            Some("Transportation projects")
        );
    }

    #[test]
    fn test_agency_capture_stops_at_boundary() {
        let filters = extract("Department of Labor in 2022");
        assert_eq!(filters.agency.as_deref(), Some("Labor"));
        assert_eq!(filters.year, Some(2022));
    }

    #[test]
    fn test_agency_keeps_internal_and() {
        assert_eq!(
            extract("Department of Housing and Urban Development in 2022")
                .agency
                .as_deref(),
            Some("Housing and Urban Development")
        );
        // An "and" that introduces a second department ends the first name
        assert_eq!(
            extract("Compare Department of Labor and Department of Transportation")
                .agency
                .as_deref(),
            Some("Labor")
        );
    }

    #[test]
    fn test_agency_acronym_form() {
        assert_eq!(
            extract("HUD Department spending").agency.as_deref(),
            Some("HUD")
        );
    }

    #[test]
    fn test_amount_bounds() {
        let filters = extract("earmarks over $2.5 million but under $10 million");
        assert_eq!(filters.min_amount, Some(2_500_000.0));
        assert_eq!(filters.max_amount, Some(10_000_000.0));

        assert_eq!(
            extract("grants above 750,000 dollars").min_amount,
            Some(750_000.0)
        );
        assert_eq!(extract("less than $3m").max_amount, Some(3_000_000.0));
    }

    #[test]
    fn test_parse_dollars_shorthand() {
        assert_eq!(parse_dollars("5,000"), 5_000.0);
        assert_eq!(parse_dollars("2.5"), 2.5);
        assert_eq!(parse_dollars("3m"), 3_000_000.0);
        assert_eq!(parse_dollars("3 million"), 3_000_000.0);
        assert_eq!(parse_dollars("garbage"), 0.0);
    }

    #[test]
    fn test_keyword_residue_excludes_entities_and_stopwords() {
        let filters = extract("Show me hospital earmarks from Sen. Collins in FY 2022");
        assert_eq!(filters.member.as_deref(), Some("Collins"));
        assert_eq!(filters.year, Some(2022));
        assert_eq!(filters.keywords, vec!["hospital"]);
    }

    #[test]
    fn test_no_entities_all_keywords() {
        let filters = extract("rural broadband infrastructure");
        assert!(filters.member.is_none());
        assert!(filters.year.is_none());
        assert_eq!(
            filters.keywords,
            vec!["rural", "broadband", "infrastructure"]
        );
    }

    #[test]
    fn test_empty_question() {
        let filters = extract("");
        assert!(filters.is_empty());
    }
}
