use chrono::{DateTime, Utc};
use helpdesk_core::view::TicketView;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Header plus message timeline, as the viewer is allowed to see it.
pub fn print_ticket(view: &TicketView) {
    println!("{}: {}", view.id, view.title);
    println!("  status:    {}", view.status);
    println!("  sector:    {}", view.sector);
    println!("  priority:  {}", view.priority);
    println!("  requester: {} ({})", view.requester_name, view.requester_id);
    println!("  assigned:  {}", or_dash(view.assigned_agent_id.as_deref()));
    if let Some(rating) = view.rating {
        println!("  rating:    {rating}/5");
    }
    if let Some(triage) = &view.triage {
        println!(
            "  triage:    {:.0}% confident, {}",
            triage.confidence_score * 100.0,
            triage.reasoning
        );
    }
    println!();
    for m in &view.messages {
        let tag = if m.is_internal {
            " [internal]"
        } else if m.is_automated {
            " [auto]"
        } else {
            ""
        };
        println!("[{}] {}{tag}:", timestamp(&m.created_at), m.sender_name);
        for line in m.content.lines() {
            println!("    {line}");
        }
    }
}
