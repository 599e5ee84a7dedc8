//! Heuristic field extraction from cleaned posting text.

use std::sync::LazyLock;

use regex::Regex;
use vitae_core::model::{JobPosting, Salary};

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern"));

static META_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta[^>]+property\s*=\s*["'](og:title|og:site_name)["'][^>]+content\s*=\s*["']([^"']+)["']"#,
    )
    .expect("meta property pattern")
});

static BULLET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.{3,})$").expect("bullet pattern"));

static SALARY_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\$|USD\s*)\s*(\d{2,3})[,.]?(\d{3})?\s*(?:-|to|–)\s*(?:\$|USD\s*)?\s*(\d{2,3})[,.]?(\d{3})?")
        .expect("salary pattern")
});

static LOCATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*location\s*[:\-]\s*(.+)$").expect("location pattern")
});

/// Builds a posting from the raw HTML and its cleaned text form.
pub(crate) fn posting_from_html(html: &str, text: String, source_url: &str) -> JobPosting {
    let mut posting = posting_from_text(text);

    let mut og_title = None;
    let mut og_site = None;
    for capture in META_PROPERTY.captures_iter(html) {
        match capture[1].to_ascii_lowercase().as_str() {
            "og:title" => og_title = Some(capture[2].trim().to_string()),
            "og:site_name" => og_site = Some(capture[2].trim().to_string()),
            _ => {}
        }
    }

    let title_tag = TITLE_TAG
        .captures(html)
        .map(|capture| capture[1].trim().to_string())
        .filter(|title| !title.is_empty());

    // og:title beats the <title> tag, which often carries board branding.
    if let Some(title) = og_title.or(title_tag) {
        let (job_title, company) = split_title(&title);
        posting.title = Some(job_title);
        if posting.company_name.is_none() {
            posting.company_name = company;
        }
    }
    if posting.company_name.is_none() {
        posting.company_name = og_site;
    }
    posting.source_url = Some(source_url.to_string());

    posting
}

/// Builds a posting from cleaned or pasted plain text.
pub(crate) fn posting_from_text(text: String) -> JobPosting {
    let requirements: Vec<String> = text
        .lines()
        .filter_map(|line| {
            BULLET_LINE
                .captures(line)
                .map(|capture| capture[1].trim().to_string())
        })
        .collect();

    let salary = SALARY_RANGE.captures(&text).map(|capture| {
        let min = join_number(capture.get(1), capture.get(2));
        let max = join_number(capture.get(3), capture.get(4));
        Salary {
            min,
            max,
            currency: Some("USD".to_string()),
        }
    });

    let location = LOCATION_LINE
        .captures(&text)
        .map(|capture| capture[1].trim().to_string());

    // Without markup the first non-empty line is the best title guess.
    let title = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .filter(|line| line.len() < 120)
        .map(str::to_string);

    JobPosting {
        title,
        company_name: None,
        location,
        description: text,
        requirements,
        salary,
        source_url: None,
    }
}

/// Splits board-style titles like `Senior Engineer - Acme Corp` or
/// `Senior Engineer | Acme Corp` into title and company.
fn split_title(raw: &str) -> (String, Option<String>) {
    for separator in [" | ", " - ", " – ", " at "] {
        if let Some((left, right)) = raw.split_once(separator) {
            let left = left.trim();
            let right = right.trim();
            if !left.is_empty() && !right.is_empty() {
                return (left.to_string(), Some(right.to_string()));
            }
        }
    }
    (raw.trim().to_string(), None)
}

fn join_number(
    thousands: Option<regex::Match<'_>>,
    remainder: Option<regex::Match<'_>>,
) -> Option<u64> {
    let head: u64 = thousands?.as_str().parse().ok()?;
    Some(match remainder {
        Some(rest) => head * 1000 + rest.as_str().parse::<u64>().ok()?,
        // A bare two/three digit figure reads as thousands, e.g. "$120-150k".
        None => head * 1000,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_title_and_company_from_og_tags() {
        let html = r#"<html><head>
            <title>Jobs Board</title>
            <meta property="og:title" content="Staff Engineer | Acme Corp" />
        </head><body><p>Build things.</p></body></html>"#;

        let posting = posting_from_html(html, "Build things.".into(), "https://a.example/j/1");
        assert_eq!(posting.title.as_deref(), Some("Staff Engineer"));
        assert_eq!(posting.company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(posting.source_url.as_deref(), Some("https://a.example/j/1"));
    }

    #[test]
    fn extracts_requirements_from_bullets() {
        let text = "Senior Rust Engineer\n\nRequirements:\n- 5 years of Rust\n- Tokio experience\n* Kubernetes\n".to_string();
        let posting = posting_from_text(text);
        assert_eq!(
            posting.requirements,
            vec!["5 years of Rust", "Tokio experience", "Kubernetes"]
        );
        assert_eq!(posting.title.as_deref(), Some("Senior Rust Engineer"));
    }

    #[test]
    fn extracts_salary_ranges() {
        let posting = posting_from_text("Pay: $120,000 - $150,000 per year".into());
        let salary = posting.salary.expect("salary parsed");
        assert_eq!(salary.min, Some(120_000));
        assert_eq!(salary.max, Some(150_000));
        assert_eq!(salary.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn extracts_location_lines() {
        let posting = posting_from_text("Engineer\nLocation: Berlin, Germany\n".into());
        assert_eq!(posting.location.as_deref(), Some("Berlin, Germany"));
    }
}
