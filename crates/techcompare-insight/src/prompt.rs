use std::fmt::Write as _;

use crate::types::NarrativeRequest;

pub const SYSTEM_INSTRUCTION: &str = "You are a pragmatic software architect. Given scored \
technologies, write a short recommendation (at most five sentences) that names the strongest \
option for the stated context and the main trade-off. Do not invent numbers.";

/// Renders the user prompt. Output depends only on the request, so the same
/// comparison always produces the same prompt.
pub fn render_prompt(request: &NarrativeRequest) -> String {
    let mut out = String::from("Compared technologies:\n");
    for subject in &request.subjects {
        let _ = write!(
            out,
            "- {} ({}): overall {:.1}/100",
            subject.name, subject.category, subject.overall_score
        );
        if !subject.criterion_scores.is_empty() {
            let parts: Vec<String> = subject
                .criterion_scores
                .iter()
                .map(|(criterion, score)| format!("{criterion} {score:.1}"))
                .collect();
            let _ = write!(out, "; {}", parts.join(", "));
        }
        out.push('\n');
    }

    let mut context = Vec::new();
    if !request.priority_tags.is_empty() {
        context.push(format!("priorities: {}", request.priority_tags.join(", ")));
    }
    if let Some(project_type) = &request.project_type {
        context.push(format!("project type: {project_type}"));
    }
    if let Some(team_size) = &request.team_size {
        context.push(format!("team size: {team_size}"));
    }
    if let Some(timeline) = &request.timeline {
        context.push(format!("timeline: {timeline}"));
    }
    if !context.is_empty() {
        let _ = writeln!(out, "Context: {}", context.join("; "));
    }

    out.push_str("Recommend one option and explain why in plain prose.");
    out
}
