//! LaTeX document rendering for resume exports.

use vitae_core::model::{Resume, ResumeSection};
use vitae_core::{ErrorKind, Result};

/// Themes the exporter ships with.
const THEMES: &[&str] = &["classic", "modern"];

/// Renders `resume` as a complete LaTeX document in the given theme.
///
/// Unknown themes are a validation error; every text fragment passes through
/// LaTeX escaping so stored resume content cannot break the document.
pub fn render_document(resume: &Resume, theme: &str) -> Result<String> {
    if !THEMES.contains(&theme) {
        return Err(ErrorKind::ValidationFailed.with_message(format!(
            "unknown theme '{theme}', expected one of: {}",
            THEMES.join(", ")
        )));
    }

    let mut body = String::new();

    if let Some(name) = &resume.name {
        body.push_str(&format!("\\begin{{center}}{{\\Huge {}}}\\end{{center}}\n", escape(name)));
    }
    if let Some(email) = &resume.email {
        body.push_str(&format!("\\begin{{center}}{}\\end{{center}}\n", escape(email)));
    }

    for section in &resume.sections {
        body.push_str(&render_section(section));
    }

    let preamble = match theme {
        "modern" => {
            "\\documentclass[11pt]{article}\n\
             \\usepackage[margin=1.5cm]{geometry}\n\
             \\usepackage{helvet}\n\
             \\renewcommand{\\familydefault}{\\sfdefault}\n\
             \\pagestyle{empty}\n"
        }
        _ => {
            "\\documentclass[11pt]{article}\n\
             \\usepackage[margin=2cm]{geometry}\n\
             \\pagestyle{empty}\n"
        }
    };

    Ok(format!(
        "{preamble}\\begin{{document}}\n{body}\\end{{document}}\n"
    ))
}

fn render_section(section: &ResumeSection) -> String {
    match section {
        ResumeSection::Summary { text } => {
            format!("\\section*{{Summary}}\n{}\n", escape(text))
        }
        ResumeSection::Experience {
            company,
            title,
            start,
            end,
            highlights,
        } => {
            let dates = match (start, end) {
                (Some(start), Some(end)) => format!(" \\hfill {}--{}", escape(start), escape(end)),
                (Some(start), None) => format!(" \\hfill {}--present", escape(start)),
                _ => String::new(),
            };
            let mut out = format!(
                "\\subsection*{{{} \\textnormal{{at {}}}{dates}}}\n",
                escape(title),
                escape(company)
            );
            out.push_str(&render_highlights(highlights));
            out
        }
        ResumeSection::Education {
            institution,
            degree,
            year,
        } => {
            let year = year
                .as_deref()
                .map(|year| format!(" \\hfill {}", escape(year)))
                .unwrap_or_default();
            format!(
                "\\subsection*{{{} \\textnormal{{{}}}{year}}}\n",
                escape(institution),
                escape(degree)
            )
        }
        ResumeSection::Skills { items } => {
            let joined = items.iter().map(|item| escape(item)).collect::<Vec<_>>().join(", ");
            format!("\\section*{{Skills}}\n{joined}\n")
        }
        ResumeSection::Projects {
            name,
            description,
            highlights,
        } => {
            let mut out = format!("\\subsection*{{{}}}\n", escape(name));
            if let Some(description) = description {
                out.push_str(&format!("{}\n", escape(description)));
            }
            out.push_str(&render_highlights(highlights));
            out
        }
        // Unmodeled sections cannot be rendered faithfully; skip them
        // rather than emit broken markup.
        ResumeSection::Unknown(_) => String::new(),
    }
}

fn render_highlights(highlights: &[String]) -> String {
    if highlights.is_empty() {
        return String::new();
    }

    let items = highlights
        .iter()
        .map(|highlight| format!("  \\item {}\n", escape(highlight)))
        .collect::<String>();
    format!("\\begin{{itemize}}\n{items}\\end{{itemize}}\n")
}

/// Escapes LaTeX special characters.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => out.push_str("\\textbackslash{}"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            other => out.push(other),
        }
    }
    out
}
