//! Interpretation of order replies.
//!
//! The broker answers order requests with a bare ticket number, a JSON
//! object, or free text depending on endpoint and outcome. Readers are tried
//! in a fixed order and the first one that recognises the body decides.

use relay_core::json;
use relay_core::types::BrokerReply;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Return codes meaning the broker accepted the order
/// (placed, done, done partially).
pub const ACCEPTED_RETCODES: &[i64] = &[10008, 10009, 10010];

const RETCODE_KEYS: &[&str] = &["retcode", "retCode", "code"];
const TICKET_KEYS: &[&str] = &["ticket", "order", "orderId", "deal"];
const MESSAGE_KEYS: &[&str] = &["message", "comment", "error", "description"];
const SUCCESS_KEYWORDS: &[&str] = &["success", "executed"];

/// What an order reply said.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub success: bool,
    pub message: String,
    pub order_id: Option<i64>,
    /// Profit reported by the reply itself
    pub profit: Option<Decimal>,
}

impl Interpretation {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            order_id: None,
            profit: None,
        }
    }
}

type Reader = fn(&str) -> Option<Interpretation>;

/// Reads order replies in priority order: ticket number, JSON, keyword scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseInterpreter;

impl ResponseInterpreter {
    const READERS: &'static [Reader] = &[read_ticket, read_json, read_text];

    pub fn new() -> Self {
        Self
    }

    /// Interpret a reply. Non-2xx statuses fail with the body as message.
    pub fn interpret(&self, reply: &BrokerReply) -> Interpretation {
        let body = reply.body.trim();
        if !reply.is_success() {
            let message = if body.is_empty() {
                format!("HTTP {}", reply.status)
            } else {
                body.to_string()
            };
            return Interpretation::failure(message);
        }

        Self::READERS
            .iter()
            .find_map(|read| read(body))
            .unwrap_or_else(|| Interpretation::failure(body))
    }
}

/// Whole body is a positive integer: the new ticket.
fn read_ticket(body: &str) -> Option<Interpretation> {
    let ticket: i64 = body.parse().ok().filter(|t| *t > 0)?;
    Some(Interpretation {
        success: true,
        message: format!("Order accepted, ticket {ticket}"),
        order_id: Some(ticket),
        profit: None,
    })
}

fn read_json(body: &str) -> Option<Interpretation> {
    match serde_json::from_str::<Value>(body).ok()? {
        Value::Object(obj) => Some(read_object(&obj)),
        Value::String(text) => read_text(&text),
        _ => None,
    }
}

fn read_object(obj: &Map<String, Value>) -> Interpretation {
    let retcode = json::field(obj, RETCODE_KEYS).and_then(json::integer);
    let order_id = json::field(obj, TICKET_KEYS)
        .and_then(json::integer)
        .filter(|t| *t > 0);
    let flagged = matches!(obj.get("success"), Some(Value::Bool(true)));
    let accepted = retcode.is_some_and(|c| ACCEPTED_RETCODES.contains(&c));

    let message = json::field(obj, MESSAGE_KEYS).and_then(json::text);

    if accepted || order_id.is_some() || flagged {
        Interpretation {
            success: true,
            message: message.unwrap_or_else(|| "Order executed".to_string()),
            order_id,
            profit: json::field(obj, &["profit"]).and_then(json::decimal),
        }
    } else {
        let message = match (message, retcode) {
            (Some(m), Some(c)) => format!("{m} (retcode {c})"),
            (Some(m), None) => m,
            (None, Some(c)) => format!("Order rejected (retcode {c})"),
            (None, None) => Value::Object(obj.clone()).to_string(),
        };
        Interpretation::failure(message)
    }
}

/// Free text: success only when it says so.
fn read_text(body: &str) -> Option<Interpretation> {
    let lower = body.to_lowercase();
    let success = SUCCESS_KEYWORDS.iter().any(|k| lower.contains(k));
    Some(Interpretation {
        success,
        message: body.to_string(),
        order_id: None,
        profit: None,
    })
}
