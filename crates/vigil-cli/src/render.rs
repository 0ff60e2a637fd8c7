//! Terminal rendering of the session dashboard.
//!
//! Everything here is direct, stateless presentation of already-computed
//! values: the derived views come from `vigil-core` and are recomputed on
//! every render.

use owo_colors::OwoColorize;

use vigil_core::discovery::{DiscoveryMetrics, discovery_frontier};
use vigil_core::ranking::rank_entities;
use vigil_core::session::{Entity, ResearchPlan, SessionSnapshot, SessionStatus};
use vigil_core::stage::{Stage, StageKind, derive_stages};

use crate::OutputFormat;

const VELOCITY_BAR_WIDTH: u64 = 30;
const LOG_TAIL_LINES: usize = 8;

/// Visual class of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Routine progress output.
    Info,
    /// A discovery was made.
    Success,
    /// A worker was stopped or killed.
    Warning,
}

/// Classifies a backend log line for display emphasis.
#[must_use]
pub fn classify_log(line: &str) -> LogKind {
    if line.contains("Found") || line.contains("New") {
        LogKind::Success
    } else if line.contains("Stopping") || line.contains("Killed") {
        LogKind::Warning
    } else {
        LogKind::Info
    }
}

/// Renders a session status with terminal colors.
#[must_use]
pub fn colorize_status(status: SessionStatus) -> String {
    match status {
        SessionStatus::Completed => status.to_string().green().to_string(),
        SessionStatus::Running | SessionStatus::VerificationPending => {
            status.to_string().blue().to_string()
        }
        SessionStatus::Initialized => status.to_string().yellow().to_string(),
        SessionStatus::Failed
        | SessionStatus::Killed
        | SessionStatus::Cancelled
        | SessionStatus::TimedOut => status.to_string().red().to_string(),
    }
}

/// One-line progress indicator over the five derived stages.
#[must_use]
pub fn format_stage_line(stages: &[Stage]) -> String {
    stages
        .iter()
        .map(|stage| {
            let marker = if stage.is_done {
                "[x]"
            } else if stage.is_active {
                "[>]"
            } else {
                "[ ]"
            };
            format!("{marker} {}", stage.kind)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// The strategic-plan section of the text dashboard, one line per item.
#[must_use]
pub fn format_plan_lines(plan: &ResearchPlan) -> Vec<String> {
    if plan.current_hypothesis.is_empty()
        && plan.findings_summary.is_empty()
        && plan.reasoning.is_none()
        && plan.gaps.is_empty()
        && plan.next_steps.is_empty()
    {
        return vec!["plan is being formulated by the orchestrator".to_string()];
    }

    let mut lines = Vec::new();
    if !plan.current_hypothesis.is_empty() {
        lines.push(format!("Hypothesis: {}", plan.current_hypothesis));
    }
    if let Some(reasoning) = &plan.reasoning {
        lines.push(format!("Reasoning: {reasoning}"));
    }
    if !plan.findings_summary.is_empty() {
        lines.push(format!("Findings: {}", plan.findings_summary));
    }
    for gap in &plan.gaps {
        lines.push(format!("Gap [{}]: {}", gap.priority, gap.description));
    }
    for step in &plan.next_steps {
        lines.push(format!("Next: {step}"));
    }
    lines
}

/// One ranked entity as a text dashboard line, with its evidence volume.
#[must_use]
pub fn format_entity_line(entity: &Entity) -> String {
    format!(
        "{} [{}] {} mentions, {} evidence, confidence {:.0}%",
        entity.canonical_name,
        entity.verification_status,
        entity.mention_count,
        entity.evidence.len(),
        entity.confidence_score * 100.0
    )
}

/// A horizontal bar scaled against the chart ceiling.
#[must_use]
pub fn velocity_bar(value: u64, ceiling: u64) -> String {
    let ceiling = ceiling.max(1);
    let filled = (value.saturating_mul(VELOCITY_BAR_WIDTH) / ceiling).min(VELOCITY_BAR_WIDTH);
    "#".repeat(usize::try_from(filled).unwrap_or(0))
}

/// Renders the full dashboard for one snapshot.
pub fn render_dashboard(snapshot: &SessionSnapshot, format: &OutputFormat) {
    if matches!(format, OutputFormat::Json) {
        match serde_json::to_string_pretty(snapshot) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to serialize snapshot: {err}"),
        }
        return;
    }

    println!();
    println!(
        "{} {} ({})",
        "Research:".bold(),
        snapshot.topic,
        colorize_status(snapshot.status)
    );

    let stages = derive_stages(snapshot.status, snapshot.iteration_count);
    println!("  {}", format_stage_line(&stages));
    if stages.iter().any(|s| s.kind == StageKind::Failed) {
        println!("  {}", "session ended before completing".red());
    }

    let metrics = DiscoveryMetrics::from_workers(&snapshot.workers);
    println!();
    println!(
        "  Iteration: {}   Yield: {}/page   Recall: {}   Pages: {}",
        snapshot.iteration_count,
        metrics.yield_display(),
        metrics.recall,
        metrics.pages_fetched
    );

    if !metrics.velocity.is_empty() {
        let ceiling = metrics.chart_ceiling();
        println!();
        println!("  Discovery velocity (new entities per iteration):");
        for (iteration, count) in &metrics.velocity {
            println!(
                "    iter {iteration:>3} | {:<width$} {count}",
                velocity_bar(*count, ceiling),
                width = usize::try_from(VELOCITY_BAR_WIDTH).unwrap_or(30)
            );
        }
    }

    if !snapshot.workers.is_empty() {
        println!();
        println!("  Workers:");
        for worker in snapshot.workers.values() {
            println!(
                "    {} [{}] {} - {} pages ({}%), {} entities",
                worker.id,
                worker.status,
                worker.strategy,
                worker.pages_fetched,
                worker.progress_percent(),
                worker.entities_found
            );
        }
    }

    println!();
    println!("  Research plan:");
    for line in format_plan_lines(&snapshot.plan) {
        println!("    {line}");
    }

    render_entities(snapshot, format);

    let frontier = discovery_frontier(&snapshot.workers);
    println!();
    println!(
        "  Sites visited: {}   Frontier size: {}",
        snapshot.visited_urls.len(),
        frontier.len()
    );

    if !snapshot.logs.is_empty() {
        println!();
        println!("  Recent logs:");
        let tail = snapshot.logs.len().saturating_sub(LOG_TAIL_LINES);
        for line in &snapshot.logs[tail..] {
            match classify_log(line) {
                LogKind::Success => println!("    {}", line.green()),
                LogKind::Warning => println!("    {}", line.yellow()),
                LogKind::Info => println!("    {line}"),
            }
        }
    }
}

fn render_entities(snapshot: &SessionSnapshot, format: &OutputFormat) {
    let ranked = rank_entities(&snapshot.entities);
    if ranked.is_empty() {
        println!();
        println!("  No entities discovered yet");
        return;
    }

    println!();
    println!("  Discovered entities:");

    if matches!(format, OutputFormat::Table) {
        use tabled::{Table, Tabled};

        #[derive(Tabled)]
        struct EntityRow {
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Phase")]
            phase: String,
            #[tabled(rename = "Mentions")]
            mentions: u64,
            #[tabled(rename = "Evidence")]
            evidence: usize,
            #[tabled(rename = "Status")]
            status: String,
            #[tabled(rename = "Confidence")]
            confidence: String,
        }

        let rows: Vec<_> = ranked
            .iter()
            .map(|e| EntityRow {
                name: e.canonical_name.clone(),
                phase: e
                    .clinical_phase
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                mentions: e.mention_count,
                evidence: e.evidence.len(),
                status: e.verification_status.to_string(),
                confidence: format!("{:.0}%", e.confidence_score * 100.0),
            })
            .collect();
        println!("{}", Table::new(rows));
    } else {
        for entity in ranked {
            println!("    {}", format_entity_line(entity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use vigil_core::session::{
        EvidenceSnippet, Gap, GapPriority, VerificationStatus,
    };

    #[test]
    fn plan_section_shows_hypothesis_gaps_and_next_steps() {
        let plan = ResearchPlan {
            current_hypothesis: "CDK12 degraders are underreported in CN filings".to_string(),
            findings_summary: "3 preclinical assets confirmed".to_string(),
            gaps: vec![Gap {
                description: "no coverage of Korean biotechs".to_string(),
                priority: GapPriority::High,
                reasoning: String::new(),
            }],
            next_steps: vec!["query KIPO filings".to_string()],
            reasoning: Some("broad sweep first, then registries".to_string()),
        };

        let lines = format_plan_lines(&plan);
        assert!(lines.contains(&"Hypothesis: CDK12 degraders are underreported in CN filings".to_string()));
        assert!(lines.contains(&"Findings: 3 preclinical assets confirmed".to_string()));
        assert!(lines.contains(&"Gap [high]: no coverage of Korean biotechs".to_string()));
        assert!(lines.contains(&"Next: query KIPO filings".to_string()));
        assert!(lines.contains(&"Reasoning: broad sweep first, then registries".to_string()));
    }

    #[test]
    fn empty_plan_renders_a_placeholder() {
        let lines = format_plan_lines(&ResearchPlan::default());
        assert_eq!(
            lines,
            vec!["plan is being formulated by the orchestrator".to_string()]
        );
    }

    #[test]
    fn entity_line_includes_evidence_volume() {
        let entity = Entity {
            canonical_name: "BMS-986158".to_string(),
            aliases: BTreeSet::new(),
            drug_class: None,
            clinical_phase: Some("Phase 1".to_string()),
            attributes: BTreeMap::new(),
            evidence: vec![EvidenceSnippet {
                source_url: "https://pubmed.example/1".to_string(),
                content: "a BET inhibitor".to_string(),
                timestamp: chrono::Utc::now(),
            }],
            mention_count: 4,
            verification_status: VerificationStatus::Verified,
            rejection_reason: None,
            confidence_score: 0.85,
        };

        let line = format_entity_line(&entity);
        assert_eq!(
            line,
            "BMS-986158 [VERIFIED] 4 mentions, 1 evidence, confidence 85%"
        );
    }

    #[test]
    fn log_classification_matches_backend_phrasing() {
        assert_eq!(classify_log("Found 3 new entities"), LogKind::Success);
        assert_eq!(classify_log("New worker spawned"), LogKind::Success);
        assert_eq!(classify_log("Stopping worker w-1"), LogKind::Warning);
        assert_eq!(classify_log("Killed dead-end worker"), LogKind::Warning);
        assert_eq!(classify_log("iteration 2 started"), LogKind::Info);
    }

    #[test]
    fn stage_line_marks_done_active_and_pending() {
        let stages = derive_stages(SessionStatus::Running, 1);
        let line = format_stage_line(&stages);
        assert!(line.contains("[x] Preparation"));
        assert!(line.contains("[>] Discovery"));
        assert!(line.contains("[ ] Deep Dive"));
    }

    #[test]
    fn velocity_bar_scales_to_ceiling() {
        assert_eq!(velocity_bar(10, 10).len(), 30);
        assert_eq!(velocity_bar(5, 10).len(), 15);
        assert_eq!(velocity_bar(0, 10).len(), 0);
        // Never exceeds the bar width even if a bucket beats the ceiling.
        assert_eq!(velocity_bar(20, 10).len(), 30);
    }
}
