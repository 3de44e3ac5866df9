//! Prompts and response schemas for the two classifier questions.

use helpdesk_core::kb_import::ArticleDraftRequest;
use helpdesk_core::message::SYSTEM_SENDER_NAME;
use helpdesk_core::triage::TriageRequest;
use helpdesk_core::types::Priority;
use serde_json::{json, Value};

pub fn triage_prompt(req: &TriageRequest) -> String {
    let agents = req
        .available_agents
        .iter()
        .map(|a| format!("- ID: {}, Name: {}, Sector: {}", a.id, a.name, a.sector))
        .collect::<Vec<_>>()
        .join("\n");
    let knowledge = req
        .approved_knowledge
        .iter()
        .map(|k| format!("- [{}]: {} (Tags: {})", k.title, k.content, k.tags.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert support dispatcher running ticket triage.

Analyze this ticket:
Title: "{title}"
Description: "{description}"

Base your decision on:

1. Available agents:
{agents}

2. Knowledge base (rules and past solutions):
{knowledge}

3. Available sectors: {sectors}

Instructions:
- Pick the sector using ONLY one of the available sectors.
- Set the priority: critical if it stops the business or billing, high if it stops one user, medium if partial, low for questions and simple requests.
- Choose the ID of the agent whose sector matches the problem.
- Write an autoResponse that is empathetic and tries to solve the problem from the knowledge base, or says a technician has been notified.
- If the knowledge base has a direct solution, include it in the response."#,
        title = req.title,
        description = req.description,
        sectors = req.available_sectors.join(", "),
    )
}

pub fn triage_schema(req: &TriageRequest) -> Value {
    let priorities: Vec<&str> = Priority::all().iter().map(|p| p.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "sector": {
                "type": "STRING",
                "enum": req.available_sectors,
                "description": "The sector best placed to solve the problem."
            },
            "priority": {
                "type": "STRING",
                "enum": priorities,
                "description": "Priority based on urgency and impact."
            },
            "suggestedAgentId": {
                "type": "STRING",
                "description": "ID of the best agent for the problem, from the list given."
            },
            "reasoning": {
                "type": "STRING",
                "description": "Short explanation of the sector and priority chosen."
            },
            "autoResponse": {
                "type": "STRING",
                "description": "A friendly, technical first reply grounded in the knowledge base."
            },
            "confidenceScore": {
                "type": "NUMBER",
                "description": "Confidence in the classification from 0 to 1."
            }
        },
        "required": ["sector", "priority", "suggestedAgentId", "reasoning", "autoResponse", "confidenceScore"]
    })
}

pub fn draft_prompt(req: &ArticleDraftRequest) -> String {
    let history = req
        .message_history
        .iter()
        .map(|m| {
            let kind = if m.sender_name == SYSTEM_SENDER_NAME {
                "System"
            } else if m.is_internal {
                "Internal"
            } else {
                "User"
            };
            format!("{} ({kind}): {}", m.sender_name, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a technical documentation specialist drafting a knowledge-base article from a resolved ticket.

Ticket:
Original title: "{title}"
Sector: {sector}
Conversation:
{history}

Instructions:
1. Work out what the real problem was. Ignore greetings and small talk.
2. Write a problemDescription stating the symptom and, if identifiable, the cause, in impersonal technical language.
3. Produce a standardized suggestedTitle (e.g. "Login failure - error 500" rather than "can't get in").
4. Produce relevant tags.
5. IMPORTANT: if the history is vague, has no technical detail, or the problem cannot be understood (e.g. only "hi", "testing", "solved"), set sufficientInformation to false."#,
        title = req.ticket_title,
        sector = req.sector,
    )
}

pub fn draft_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "problemDescription": {
                "type": "STRING",
                "description": "Clear technical summary of the problem reported in the ticket."
            },
            "suggestedTitle": {
                "type": "STRING",
                "description": "Short standardized title for the article."
            },
            "suggestedTags": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Search tags (e.g. hardware, printer, network)."
            },
            "sufficientInformation": {
                "type": "BOOLEAN",
                "description": "True if a clear technical problem could be identified in the history."
            }
        },
        "required": ["problemDescription", "suggestedTitle", "suggestedTags", "sufficientInformation"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::triage::AgentProfile;

    fn request() -> TriageRequest {
        TriageRequest {
            title: "VPN down".to_string(),
            description: "no connection".to_string(),
            available_agents: vec![AgentProfile {
                id: "U2".to_string(),
                name: "Carl".to_string(),
                sector: "IT".to_string(),
            }],
            approved_knowledge: Vec::new(),
            available_sectors: vec!["IT".to_string(), "Sales".to_string()],
        }
    }

    #[test]
    fn triage_prompt_lists_agents_and_sectors() {
        let p = triage_prompt(&request());
        assert!(p.contains("ID: U2, Name: Carl, Sector: IT"));
        assert!(p.contains("Available sectors: IT, Sales"));
    }

    #[test]
    fn triage_schema_restricts_sector_and_priority() {
        let s = triage_schema(&request());
        assert_eq!(s["properties"]["sector"]["enum"], json!(["IT", "Sales"]));
        assert_eq!(
            s["properties"]["priority"]["enum"],
            json!(["low", "medium", "high", "critical"])
        );
    }
}
