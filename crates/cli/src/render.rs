//! Plain-text rendering of analyses and results.

use verae_client::models::{AnalysisListItem, AnalysisSnapshot, RiskResult};
use verae_core::risk::{Direction, RiskTier};

/// Width of the severity bar in characters.
const BAR_WIDTH: usize = 20;

/// Print one status line for an analysis snapshot.
pub fn print_snapshot(snapshot: &AnalysisSnapshot) {
    match &snapshot.progress_stage {
        Some(stage) => println!("Status: {} ({stage})", snapshot.status),
        None => println!("Status: {}", snapshot.status),
    }
}

/// Print the full risk assessment.
pub fn print_result(result: &RiskResult) {
    match result.risk_percent {
        Some(percent) => println!("Risk: {} ({percent}%)", result.risk_tier),
        None => println!("Risk: {}", result.risk_tier),
    }
    println!("  {}", severity_bar(result.risk_tier));
    println!("  LOW < GRAY < WARNING < HIGH");

    if let Some(action) = &result.clinical_action {
        println!("Recommendation: {action}");
    }
    if let Some(confidence) = result.confidence {
        println!("Confidence: {confidence}");
    }

    if !result.explanations.is_empty() {
        println!("What influenced the estimate:");
        for explanation in &result.explanations {
            let text = explanation.text.as_deref().unwrap_or("");
            let arrow = match explanation.direction {
                Some(Direction::Negative) => " (v)",
                Some(Direction::Positive) => " (^)",
                None => "",
            };
            println!("  - {}: {text}{arrow}", explanation.display_label());
        }
    }
}

/// Print the analyses list, newest-first ordering left to the service.
pub fn print_list(items: &[AnalysisListItem]) {
    if items.is_empty() {
        println!("No analyses yet.");
        return;
    }
    for item in items {
        println!(
            "{}  {:<10}  {}",
            short_id(&item.analysis_id),
            item.status,
            item.created_at.to_rfc3339(),
        );
    }
}

/// Filled bar marking the tier's position on the severity scale.
fn severity_bar(tier: RiskTier) -> String {
    let filled = (tier.scale_percent() / 100.0 * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// First eight characters of an analysis id, enough to tell entries
/// apart in a short list.
fn short_id(id: &str) -> String {
    if id.chars().count() <= 8 {
        id.to_string()
    } else {
        let prefix: String = id.chars().take(8).collect();
        format!("{prefix}…")
    }
}
