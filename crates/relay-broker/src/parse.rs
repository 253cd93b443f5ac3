//! Decoding of the broker's loosely-shaped responses.

use relay_core::error::BrokerError;
use relay_core::json;
use relay_core::types::{OpenPosition, Quote, Side};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

/// Shapes the symbol listing endpoint is known to answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedUniverse {
    /// `["EURUSD", ...]` or `[{"symbol": "EURUSD"}, ...]`
    Array(Vec<Value>),
    /// `{"symbols": [...]}` or `{"data": [...]}`
    Wrapped(Vec<Value>),
    /// `EURUSD,GBPUSD` or one symbol per line
    DelimitedText(Vec<String>),
}

type ShapeRule = fn(&str, Option<&Value>) -> Option<ParsedUniverse>;

/// Tried in order; the first rule that recognises the body wins.
const SHAPE_RULES: &[ShapeRule] = &[bare_array, wrapped_array, delimited_text];

const WRAPPER_KEYS: &[&str] = &["symbols", "data"];
const NAME_KEYS: &[&str] = &["symbol", "name", "Symbol", "Name"];

fn bare_array(_: &str, value: Option<&Value>) -> Option<ParsedUniverse> {
    match value? {
        Value::Array(items) => Some(ParsedUniverse::Array(items.clone())),
        _ => None,
    }
}

fn wrapped_array(_: &str, value: Option<&Value>) -> Option<ParsedUniverse> {
    let obj = value?.as_object()?;
    WRAPPER_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
        .map(|items| ParsedUniverse::Wrapped(items.clone()))
}

fn delimited_text(body: &str, value: Option<&Value>) -> Option<ParsedUniverse> {
    let text = match value {
        None => body,
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return None,
    };
    let symbols = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
        .map(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\''))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some(ParsedUniverse::DelimitedText(symbols))
}

impl ParsedUniverse {
    /// Detect the shape of a symbol listing body.
    pub fn detect(body: &str) -> Option<Self> {
        let value = serde_json::from_str::<Value>(body).ok();
        SHAPE_RULES.iter().find_map(|rule| rule(body, value.as_ref()))
    }

    /// Symbol names in broker order, without blanks or repeats.
    pub fn into_symbols(self) -> Vec<String> {
        let names: Vec<String> = match self {
            ParsedUniverse::Array(items) | ParsedUniverse::Wrapped(items) => {
                items.iter().filter_map(entry_name).collect()
            }
            ParsedUniverse::DelimitedText(names) => names,
        };

        let mut seen = std::collections::HashSet::new();
        names
            .into_iter()
            .filter(|s| !s.is_empty() && seen.insert(s.clone()))
            .collect()
    }
}

fn entry_name(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(obj) => json::field(obj, NAME_KEYS).and_then(json::text),
        _ => None,
    }
}

/// Parse the symbol listing body.
pub fn parse_symbols(body: &str) -> Result<Vec<String>, BrokerError> {
    ParsedUniverse::detect(body)
        .map(ParsedUniverse::into_symbols)
        .ok_or_else(|| BrokerError::Parse(format!("unrecognised symbol list: {}", preview(body))))
}

/// Parse a quote body; both bid and ask must be numeric.
pub fn parse_quote(symbol: &str, body: &str) -> Result<Quote, BrokerError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| BrokerError::Unavailable(format!("quote for {symbol}: {}", preview(body))))?;
    let obj = value
        .as_object()
        .ok_or_else(|| BrokerError::Unavailable(format!("quote for {symbol} is not an object")))?;

    let bid = json::field(obj, &["bid", "Bid"]).and_then(json::float);
    let ask = json::field(obj, &["ask", "Ask"]).and_then(json::float);
    match (bid, ask) {
        (Some(bid), Some(ask)) => Ok(Quote {
            symbol: symbol.to_string(),
            bid,
            ask,
        }),
        _ => Err(BrokerError::Unavailable(format!("quote for {symbol} has no bid/ask"))),
    }
}

/// Parse the open positions body. Anything not array-shaped is an error.
pub fn parse_positions(body: &str) -> Result<Vec<OpenPosition>, BrokerError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| BrokerError::Parse(format!("open positions: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(obj) => ["data", "orders"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .ok_or_else(|| BrokerError::Parse("open positions is not a list".into()))?,
        _ => return Err(BrokerError::Parse("open positions is not a list".into())),
    };

    Ok(items.iter().filter_map(parse_position).collect())
}

fn parse_position(entry: &Value) -> Option<OpenPosition> {
    let obj = entry.as_object()?;
    let ticket = json::field(obj, &["ticket", "order", "id"]).and_then(json::integer);
    let symbol = json::field(obj, &["symbol", "Symbol"]).and_then(json::text);

    let (Some(ticket), Some(symbol)) = (ticket, symbol) else {
        debug!("Skipping malformed position entry: {}", entry);
        return None;
    };

    Some(OpenPosition {
        ticket,
        symbol,
        side: json::field(obj, &["type", "orderType"]).and_then(parse_side),
        volume: json::field(obj, &["lots", "volume"])
            .and_then(json::decimal)
            .unwrap_or(Decimal::ZERO),
        profit: json::field(obj, &["profit"]).and_then(json::decimal),
    })
}

fn parse_side(value: &Value) -> Option<Side> {
    if let Value::Number(_) = value {
        return match json::integer(value)? {
            0 => Some(Side::Buy),
            1 => Some(Side::Sell),
            _ => None,
        };
    }

    let text = value.as_str()?.trim().to_ascii_uppercase();
    let text = text
        .strip_prefix("ORDER_TYPE_")
        .or_else(|| text.strip_prefix("POSITION_TYPE_"))
        .or_else(|| text.strip_prefix("OP_"))
        .unwrap_or(&text);
    match text {
        "BUY" => Some(Side::Buy),
        "SELL" => Some(Side::Sell),
        _ => None,
    }
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(120)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}
