//! Unified-diff rendering of a proposal's field changes for reviewers.

use serde_json::Value;
use similar::TextDiff;

use herald_core::ChangeProposal;

/// One unified diff per changed field, in field order.
///
/// Returns an empty string when the proposal changes nothing.
pub fn render_changes(proposal: &ChangeProposal) -> String {
    let mut out = String::new();
    for (field, change) in &proposal.changes {
        let old = pretty(&change.old);
        let new = pretty(&change.new);
        let old_header = format!("a/{}.{field}", proposal.section);
        let new_header = format!("b/{}.{field}", proposal.section);
        let unified = TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();
        out.push_str(&unified);
    }
    out
}

fn pretty(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}
