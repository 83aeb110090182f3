//! Catalog payload fixtures and a size-limited mock responder

use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use wiremock::{Request, Respond, ResponseTemplate};

/// Entry-list payload for the given identifiers
///
/// Every second entry is deployed on two networks, one without an address.
pub fn entry_list(ids: &[&str]) -> Value {
    Value::Array(
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                let platforms = if i % 2 == 1 {
                    json!({ "ethereum": format!("0x{i:04x}"), "solana": null })
                } else {
                    json!({})
                };
                json!({
                    "id": id,
                    "symbol": id.chars().take(3).collect::<String>(),
                    "name": id.to_uppercase(),
                    "platforms": platforms,
                })
            })
            .collect(),
    )
}

/// One market snapshot as the upstream sends it
///
/// The price is derived from the identifier's length so tests can check it.
pub fn market_snapshot(id: &str) -> Value {
    json!({
        "id": id,
        "symbol": id.chars().take(3).collect::<String>(),
        "name": id.to_uppercase(),
        "image": format!("https://img.example/{id}.png"),
        "current_price": id.len() as f64 * 1.5,
        "sparkline_in_7d": { "price": [1.0, null, 2.5] },
        "price_change_percentage_24h_in_currency": 0.0,
        "price_change_percentage_7d_in_currency": -3.5,
        "price_change_percentage_30d_in_currency": null,
        "market_cap": 1000000,
        "market_cap_rank": 7,
        "circulating_supply": 21000000.0,
        "fully_diluted_valuation": null,
        "total_supply": 21000000.0
    })
}

/// Mock markets endpoint that rejects requests carrying more than `limit` ids
///
/// Records the identifiers of every request it sees.
#[derive(Clone)]
pub struct SizeLimitedMarkets {
    limit: usize,
    omit: Vec<String>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl SizeLimitedMarkets {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            omit: Vec::new(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Identifiers the endpoint never returns data for
    pub fn omitting(mut self, ids: &[&str]) -> Self {
        self.omit = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Identifiers of every request received so far
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

impl Respond for SizeLimitedMarkets {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let ids: Vec<String> = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "ids")
            .map(|(_, value)| {
                value
                    .split(',')
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        self.seen.lock().unwrap().push(ids.clone());

        if ids.len() > self.limit {
            return ResponseTemplate::new(414);
        }

        let body: Vec<Value> = ids
            .iter()
            .filter(|id| !self.omit.contains(*id))
            .map(|id| market_snapshot(id))
            .collect();
        ResponseTemplate::new(200).set_body_json(body)
    }
}
