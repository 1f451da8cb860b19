//! Human-readable output for CLI commands.

use crate::card::AgentProfile;
use crate::worker::RequestOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::{Map, Value};

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Card identity, services and the resulting polling filter.
pub fn format_card_text(profile: &AgentProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Agent Card")));
    out.push_str(&format!("  Handle: {}\n", profile.handle));
    if let Some(name) = &profile.name {
        out.push_str(&format!("  Name: {}\n", name));
    }
    if let Some(description) = &profile.description {
        out.push_str(&format!("  Description: {}\n", description));
    }
    out.push('\n');

    out.push_str(&format!("{}\n\n", format_section_heading("Services")));
    if profile.services.is_empty() {
        out.push_str("  No services declared\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["ID", "Domains"]);
        for service in &profile.services {
            table.add_row(vec![
                service.id.clone().unwrap_or_else(|| "-".to_string()),
                service.domains.join(", "),
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    let domains = profile.polling_domains();
    if domains.is_empty() {
        out.push_str("Polling domains: (none, the worker will not start)\n");
    } else {
        out.push_str(&format!("Polling domains: {}\n", domains.join(", ")));
    }
    out
}

/// Card summary as JSON.
pub fn card_summary_json(profile: &AgentProfile) -> Value {
    serde_json::json!({
        "valid": true,
        "handle": profile.handle,
        "name": profile.name,
        "description": profile.description,
        "services": profile.services.iter().map(|s| serde_json::json!({
            "id": s.id,
            "domains": s.domains,
        })).collect::<Vec<_>>(),
        "polling_domains": profile.polling_domains(),
    })
}

pub fn format_memory_text(entries: &Map<String, Value>) -> String {
    if entries.is_empty() {
        return "Memory is empty".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Value"]);
    for (key, value) in entries {
        table.add_row(vec![key.clone(), value.to_string()]);
    }
    format!("{}\n\n{}", format_section_heading("Agent Memory"), table)
}

pub fn format_outcomes_text(outcomes: &[RequestOutcome]) -> String {
    if outcomes.is_empty() {
        return "No new requests".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Request", "Outcome", "Transaction"]);
    for outcome in outcomes {
        table.add_row(vec![
            outcome.request_id().to_string(),
            outcome.label().to_string(),
            outcome.tx_id().unwrap_or("-").to_string(),
        ]);
    }
    format!("{}\n\n{}", format_section_heading("Processed Requests"), table)
}

/// Text of a scalar field, `-` when absent.
fn field_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

/// Registry search results: one row per agent, then the page position.
pub fn format_search_text(response: &Value) -> String {
    let results = response
        .get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    if results.is_empty() {
        return "No agents found".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Handle", "Name", "Trust", "Domains"]);
    for agent in results {
        table.add_row(vec![
            field_text(agent, "handle"),
            field_text(agent, "name"),
            field_text(agent, "trust_score"),
            field_text(agent, "domains"),
        ]);
    }
    format!(
        "{}\n\n{}\n\nShowing {} of {} (offset {})",
        format_section_heading("Agents"),
        table,
        results.len(),
        field_text(response, "total"),
        field_text(response, "offset"),
    )
}

pub fn format_domains_text(response: &Value) -> String {
    let domains = response
        .get("domains")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    if domains.is_empty() {
        return "No domains".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Domain", "Agents"]);
    for domain in domains {
        // Entries are objects with `name`/`agents`, or bare names.
        let name = match domain {
            Value::String(name) => name.clone(),
            other => field_text(other, "name"),
        };
        table.add_row(vec![name, field_text(domain, "agents")]);
    }
    format!("{}\n\n{}", format_section_heading("Domains"), table)
}

/// Headline trust figures for one agent.
pub fn format_trust_text(response: &Value) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Trust")));
    for (label, key) in [
        ("Handle", "handle"),
        ("Score", "trust_score"),
        ("Grade", "grade"),
        ("ACP compatible", "acp_compatible"),
        ("Evaluated", "evaluated_at"),
    ] {
        out.push_str(&format!("  {}: {}\n", label, field_text(response, key)));
    }
    out
}
