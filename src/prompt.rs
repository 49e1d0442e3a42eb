//! Prompt assembly for the earmark answer pipeline.
//!
//! Builds the context block handed to the LLM: a one-line header with the
//! match count and total dollars, followed by a markdown table of the top
//! rows. The model is told to reference the table rather than repeat it.

use crate::models::Earmark;

/// Formats a dollar amount with thousands separators and two decimals,
/// e.g. `$2,500,000.00`.
pub fn fmt_usd(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, frac)
}

/// Builds the context string: match header plus a markdown table of the
/// first `table_rows` records.
pub fn build_context(earmarks: &[Earmark], table_rows: usize) -> String {
    if earmarks.is_empty() {
        return "No matching earmarks found.".to_string();
    }

    let total: f64 = earmarks.iter().map(|e| e.amount).sum();
    let plural = if earmarks.len() == 1 { "" } else { "s" };
    let header = format!(
        "Matched {} earmark{} worth {}.",
        earmarks.len(),
        plural,
        fmt_usd(total)
    );

    let mut table = String::from(
        "\n\n| Year | Recipient | Amount | Agency | Subcommittee |\n\
         |------|-----------|--------|--------|--------------|",
    );
    for e in earmarks.iter().take(table_rows) {
        table.push_str(&format!(
            "\n| {} | {} | {} | {} | {} |",
            e.year,
            e.recipient,
            fmt_usd(e.amount),
            e.agency.as_deref().unwrap_or(""),
            e.subcommittee.as_deref().unwrap_or(""),
        ));
    }

    format!("{}{}", header, table)
}

/// Assembles the full prompt from conversation history, the data context,
/// and the user question.
pub fn build_prompt(history: &str, context: &str, question: &str) -> String {
    let mut prompt = String::from(
        "You are an assistant who answers questions about U.S. congressional earmarks \
         (Community Project Funding).\n\n",
    );

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(history);
        prompt.push_str("\n\n");
    }

    prompt.push_str("Context:\n");
    prompt.push_str(context);
    prompt.push_str(
        "\n\nWhen you answer:\n\
         - Start with a brief summary.\n\
         - If the context includes a markdown table, reference it instead of repeating all rows.\n\
         - If no earmarks matched, say so and suggest how to broaden the question.\n\n",
    );
    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn earmark(year: i64, recipient: &str, amount: f64) -> Earmark {
        Earmark {
            id: format!("{}-{}", year, recipient),
            year,
            member: "Sen. Example".to_string(),
            recipient: recipient.to_string(),
            amount,
            agency: Some("Labor".to_string()),
            subcommittee: None,
            account: None,
            budget_function: None,
            location: None,
        }
    }

    #[test]
    fn test_fmt_usd() {
        assert_eq!(fmt_usd(0.0), "$0.00");
        assert_eq!(fmt_usd(5000.0), "$5,000.00");
        assert_eq!(fmt_usd(2_500_000.0), "$2,500,000.00");
        assert_eq!(fmt_usd(1234.5), "$1,234.50");
    }

    #[test]
    fn test_context_empty() {
        assert_eq!(build_context(&[], 10), "No matching earmarks found.");
    }

    #[test]
    fn test_context_header_singular() {
        let rows = vec![earmark(2022, "Coastal Clinic", 500_000.0)];
        let context = build_context(&rows, 10);
        assert!(context.starts_with("Matched 1 earmark worth $500,000.00."));
        assert!(context.contains("| 2022 | Coastal Clinic | $500,000.00 | Labor |  |"));
    }

    #[test]
    fn test_context_table_capped() {
        let rows: Vec<Earmark> = (0..25)
            .map(|i| earmark(2022, &format!("Recipient {}", i), 1000.0))
            .collect();
        let context = build_context(&rows, 10);
        assert!(context.starts_with("Matched 25 earmarks worth $25,000.00."));
        assert_eq!(context.matches("| 2022 |").count(), 10);
    }

    #[test]
    fn test_prompt_includes_history_when_present() {
        let with = build_prompt("User: hello", "No matching earmarks found.", "anything?");
        assert!(with.contains("Conversation so far:\nUser: hello"));

        let without = build_prompt("", "No matching earmarks found.", "anything?");
        assert!(!without.contains("Conversation so far:"));
        assert!(without.ends_with("Question: anything?"));
    }
}
