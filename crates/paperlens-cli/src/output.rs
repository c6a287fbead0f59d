use std::io::Write;

use owo_colors::OwoColorize;

use paperlens_core::{AnalysisResult, CitationStatus, ClaimStatus, Document};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the extraction summary before analysis starts.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    file_name: &str,
    document: &Document,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Analyzing {}...", file_name)?;
    if let Some(ref title) = document.title {
        if color.enabled() {
            writeln!(w, "Title: {}", title.bold())?;
        } else {
            writeln!(w, "Title: {}", title)?;
        }
    }
    writeln!(w, "{} words extracted", document.word_count)?;
    writeln!(w)?;
    Ok(())
}

/// Print the full analysis report.
pub fn print_report(
    w: &mut dyn Write,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_section_header(w, "Summary", color)?;
    writeln!(w, "{}", result.summary)?;
    writeln!(w)?;

    print_plagiarism(w, result, color)?;
    print_citations(w, result, color)?;
    print_claims(w, result, color)?;
    print_critique(w, result, color)?;

    let ms = result.processing.as_millis();
    if color.enabled() {
        writeln!(w, "{}", format!("Completed in {}ms", ms).dimmed())?;
    } else {
        writeln!(w, "Completed in {}ms", ms)?;
    }
    Ok(())
}

fn print_plagiarism(
    w: &mut dyn Write,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_section_header(w, "Plagiarism", color)?;

    let score = result.plagiarism_score;
    let label = format!("{:.1}% maximum similarity", score);
    if color.enabled() {
        if score >= 50.0 {
            writeln!(w, "{}", label.red())?;
        } else if score >= 20.0 {
            writeln!(w, "{}", label.yellow())?;
        } else {
            writeln!(w, "{}", label.green())?;
        }
    } else {
        writeln!(w, "{}", label)?;
    }

    for source in &result.plagiarism_sources {
        writeln!(w, "  {:>5.1}%  {}", source.score, source.source_id)?;
    }
    if result.plagiarism_sources.is_empty() {
        writeln!(w, "  (no corpus entries above threshold)")?;
    }
    writeln!(w)?;
    Ok(())
}

fn print_citations(
    w: &mut dyn Write,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_section_header(w, "Citations", color)?;

    if result.citations.is_empty() {
        writeln!(w, "No references section found.")?;
        writeln!(w)?;
        return Ok(());
    }

    for (i, citation) in result.citations.iter().enumerate() {
        let idx = i + 1;
        let title = if citation.cleaned_title.is_empty() {
            truncate(&citation.raw_text, 60)
        } else {
            truncate(&citation.cleaned_title, 60)
        };

        if color.enabled() {
            match citation.status {
                CitationStatus::Valid => {
                    writeln!(w, "[{}] {} \"{}\"", idx, "VALID".green(), title)?
                }
                CitationStatus::NotFound => {
                    writeln!(w, "[{}] {} \"{}\"", idx, "NOT FOUND".red(), title)?
                }
                CitationStatus::Timeout => {
                    writeln!(w, "[{}] {} \"{}\"", idx, "TIMEOUT".yellow(), title)?
                }
                CitationStatus::Error => {
                    writeln!(w, "[{}] {} \"{}\"", idx, "ERROR".yellow(), title)?
                }
            }
        } else {
            let status = match citation.status {
                CitationStatus::Valid => "VALID",
                CitationStatus::NotFound => "NOT FOUND",
                CitationStatus::Timeout => "TIMEOUT",
                CitationStatus::Error => "ERROR",
            };
            writeln!(w, "[{}] {} \"{}\"", idx, status, title)?;
        }

        if let Some(ref doi) = citation.doi {
            writeln!(w, "      DOI: {}", doi)?;
        }
    }

    let valid = result
        .citations
        .iter()
        .filter(|c| c.status == CitationStatus::Valid)
        .count();
    writeln!(w, "{}/{} citations verified", valid, result.citations.len())?;
    writeln!(w)?;
    Ok(())
}

fn print_claims(
    w: &mut dyn Write,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_section_header(w, "Fact Checks", color)?;

    if result.claims.is_empty() {
        writeln!(w, "No checkable claims extracted.")?;
        writeln!(w)?;
        return Ok(());
    }

    for claim in &result.claims {
        let text = truncate(&claim.claim_text, 70);

        if color.enabled() {
            match claim.status {
                ClaimStatus::Verified => writeln!(w, "{} {}", "VERIFIED".green(), text)?,
                ClaimStatus::Contradicted => writeln!(w, "{} {}", "CONTRADICTED".red(), text)?,
                ClaimStatus::NoVerdict => writeln!(w, "{} {}", "NO VERDICT".dimmed(), text)?,
                ClaimStatus::ApiError => writeln!(w, "{} {}", "API ERROR".yellow(), text)?,
                ClaimStatus::NotConfigured => {
                    writeln!(w, "{} {}", "NOT CONFIGURED".dimmed(), text)?
                }
            }
        } else {
            let status = match claim.status {
                ClaimStatus::Verified => "VERIFIED",
                ClaimStatus::Contradicted => "CONTRADICTED",
                ClaimStatus::NoVerdict => "NO VERDICT",
                ClaimStatus::ApiError => "API ERROR",
                ClaimStatus::NotConfigured => "NOT CONFIGURED",
            };
            writeln!(w, "{} {}", status, text)?;
        }

        for review in claim.evidence.iter().take(2) {
            writeln!(w, "    {} rated this: {}", review.publisher, review.rating)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn print_critique(
    w: &mut dyn Write,
    result: &AnalysisResult,
    color: ColorMode,
) -> std::io::Result<()> {
    print_section_header(w, "Critique", color)?;

    let critique = &result.critique;
    let groups: [(&str, &Vec<String>); 3] = [
        ("Methodology", &critique.methodology),
        ("Writing", &critique.writing_flags),
        ("Limitations", &critique.limitations),
    ];

    for (label, items) in groups {
        if items.is_empty() {
            continue;
        }
        writeln!(w, "{}:", label)?;
        for item in items {
            writeln!(w, "  - {}", item)?;
        }
    }

    if !critique.suggestions.is_empty() {
        if color.enabled() {
            writeln!(w, "{}", "Suggestions:".bold())?;
        } else {
            writeln!(w, "Suggestions:")?;
        }
        for suggestion in &critique.suggestions {
            writeln!(w, "  - {}", suggestion)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn print_section_header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", format!("=== {} ===", title).bold().cyan())?;
    } else {
        writeln!(w, "=== {} ===", title)?;
    }
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
