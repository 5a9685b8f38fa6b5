//! Scripted in-memory [`Transport`] for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;
use crate::transport::{Transport, TransportResponse};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Respond(u16, serde_json::Value),
    Fail(String),
}

impl Reply {
    pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
        Reply::Respond(status, body)
    }

    pub(crate) fn status(status: u16) -> Self {
        Reply::Respond(status, serde_json::Value::Null)
    }

    pub(crate) fn fail(reason: &str) -> Self {
        Reply::Fail(reason.to_owned())
    }
}

/// Replies are queued per URL; the last queued reply repeats forever.
/// Unscripted URLs answer 404.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    latency: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, url: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(url.to_owned())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn set_latency(&self, url: &str, latency: Duration) {
        self.latency.lock().unwrap().insert(url.to_owned(), latency);
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == url)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, url: &str) -> Reply {
        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Reply::status(404)),
            None => Reply::status(404),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, ScraperError> {
        self.calls.lock().unwrap().push(url.to_owned());
        let latency = self.latency.lock().unwrap().get(url).copied();
        let reply = self.next_reply(url);

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        match reply {
            Reply::Respond(status, body) => Ok(TransportResponse { status, body }),
            Reply::Fail(reason) => Err(ScraperError::Transport {
                url: url.to_owned(),
                reason,
            }),
        }
    }
}

/// A complete listing summary with every base field populated.
pub(crate) fn listing_summary(reference: &str) -> serde_json::Value {
    serde_json::json!({
        "publicReference": reference,
        "sale": { "advertPricing": { "price": 15950, "unit": "EUR" } },
        "priceDetail": { "vatIncluded": false },
        "engineSize": 1.6,
        "engineSizeCC": 1598,
        "vehicle": {
            "registrationYear": 2018,
            "colour": "Grey",
            "mileage": { "mileageKm": 74000 }
        },
        "searchDetailSummary": {
            "mmv": { "make": "Toyota", "model": "Corolla" },
            "fuelType": "Petrol",
            "transmission": "Manual"
        },
        "stockLocation": { "city": "Naas", "county": "Kildare" }
    })
}

/// A page body in the catalog's envelope, one item per reference.
pub(crate) fn page_body(references: &[&str]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = references
        .iter()
        .map(|r| serde_json::json!({ "summary": listing_summary(r) }))
        .collect();
    serde_json::json!({
        "totalPages": 1,
        "results": [ { "banner": true }, { "items": items } ]
    })
}

/// A detail payload for `reference`.
pub(crate) fn detail_body(reference: &str) -> serde_json::Value {
    serde_json::json!({
        "publicReference": reference,
        "vehicle": {
            "bodyType": "Hatchback",
            "doors": 5,
            "seats": 5,
            "numberOfOwners": 2,
            "nctExpiry": "2026-03",
            "taxExpiry": null
        },
        "seller": { "type": "TRADE", "name": "Naas Motors" },
        "description": "Full service history"
    })
}
