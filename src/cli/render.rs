use console::style;
use refurl::models::{RankingResult, RefineOutcome, SelectedUrl, ValidationResult};
use refurl::utils::formatting::{format_confidence, format_cost, format_duration};

/// Human-readable summary of one refinement.
pub fn render_outcome(outcome: &RefineOutcome, elapsed_ms: u64) -> String {
    let mut lines = Vec::new();
    let selection = &outcome.selection;

    lines.push(render_choice("Primary", selection.primary.as_ref()));
    lines.push(render_choice("Secondary", selection.secondary.as_ref()));

    let verdict = if selection.needs_review {
        style("needs review").yellow().bold()
    } else {
        style("high confidence").green().bold()
    };
    lines.push(format!("  {}", verdict));

    lines.push(String::new());
    for ranking in &outcome.rankings {
        lines.push(render_ranking(ranking));
    }

    let stats = &outcome.stats;
    lines.push(String::new());
    lines.push(format!(
        "  {} candidates | {} validated ({} valid, {} hard, {} soft) | {} search rounds",
        stats.total_candidates,
        stats.validated_candidates,
        stats.valid_candidates,
        stats.hard_failures,
        stats.soft_failures,
        stats.search_rounds,
    ));
    lines.push(format!(
        "  {} LLM calls | {} tokens | {} | {}",
        outcome.usage.calls,
        outcome.usage.total_tokens(),
        format_cost(outcome.usage.cost_usd),
        format_duration(elapsed_ms),
    ));
    lines.join("\n")
}

fn render_choice(role: &str, choice: Option<&SelectedUrl>) -> String {
    match choice {
        Some(c) => format!(
            "{} {:<9} {} [{} | {}] {}",
            style("✓").green(),
            role,
            style(&c.url).cyan(),
            c.score,
            format_confidence(c.confidence),
            style(&c.reason).dim(),
        ),
        None => format!("{} {:<9} {}", style("-").dim(), role, style("none").dim()),
    }
}

fn render_ranking(r: &RankingResult) -> String {
    let marker = match r.valid() {
        Some(true) => style("✓").green(),
        Some(false) => style("✗").red(),
        None => style("·").dim(),
    };
    let mut line = format!("  {} {:>3} {:>3}  {}", marker, r.primary_score, r.secondary_score, r.url);
    if let Some(reason) = r.validation_reason() {
        line.push_str(&format!(" {}", style(format!("({})", reason)).red().dim()));
    }
    line
}

pub fn render_validation(result: &ValidationResult) -> String {
    let status = result.http_status.map(|s| s.to_string()).unwrap_or_else(|| "---".to_string());
    if result.valid {
        let mut line = format!("{} {} {}", style("✓").green(), status, result.url);
        if let Some(barrier) = &result.access_barrier {
            line.push_str(&format!(" {}", style(format!("[{}]", barrier)).yellow()));
        }
        line
    } else {
        let reason = result.failure_reason.as_deref().unwrap_or("invalid");
        let detail = match &result.transport_error {
            Some(err) => format!("{}: {}", reason, err),
            None => reason.to_string(),
        };
        format!("{} {} {} {}", style("✗").red(), status, result.url, style(format!("({})", detail)).red().dim())
    }
}
