//! Blocking clients for the flights API.
//!
//! Each call is a single GET with fixed connect/read timeouts and no retries.
//! The public `fetch_*` methods never fail: network errors, non-200 answers
//! and unexpected JSON are logged and turned into an empty list or `None`.

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{FlightSummary, JsonObject, PassengerRecord, TicketDetail};

/// Source of ticket records, so the lookup pipeline can run against fakes.
pub trait TicketSource: Send + Sync {
    fn fetch_ticket(&self, flight_code: &str) -> Option<TicketDetail>;
}

#[derive(Clone)]
pub struct ApiClient {
    config: ApiConfig,
    agent: ureq::Agent,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout())
            .timeout_read(config.read_timeout())
            .build();
        Self { config, agent }
    }

    // ========================================================================
    // Flights
    // ========================================================================

    pub fn fetch_flights(&self) -> Vec<FlightSummary> {
        let url = self.config.url(&self.config.flights_path);
        match self.get_body(&url, None) {
            Ok(body) => {
                debug!(target: "flights_api", "raw response: {}", body);
                parse_list(&body, "vuelos")
                    .iter()
                    .map(FlightSummary::from_json)
                    .collect()
            }
            Err(e) => {
                error!(target: "flights_api", "request failed: {}", e);
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Passengers
    // ========================================================================

    pub fn fetch_passengers(&self, flight_code: &str) -> Vec<PassengerRecord> {
        let url = self.config.url(&self.config.passengers_path);
        match self.get_body(&url, Some(flight_code)) {
            Ok(body) => {
                debug!(target: "passengers_api", "raw response: {}", body);
                parse_list(&body, "pasajeros")
                    .iter()
                    .map(PassengerRecord::from_json)
                    .collect()
            }
            Err(e) => {
                error!(target: "passengers_api", "request failed: {}", e);
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Tickets
    // ========================================================================

    fn request_ticket(&self, flight_code: &str) -> Result<TicketDetail> {
        let url = self.config.url(&self.config.ticket_path);
        let response = self.get(&url, Some(flight_code))?;
        let status = response.status();
        debug!(target: "ticket_api", status, "HTTP response code");
        if status != 200 {
            return Err(Error::Status(status));
        }
        let body = response
            .into_string()
            .map_err(|e| Error::Network(e.to_string()))?;
        debug!(target: "ticket_api", "raw response: {}", body);
        parse_ticket(&body, flight_code)
    }

    // ========================================================================
    // Transport
    // ========================================================================

    fn get(&self, url: &str, flight_code: Option<&str>) -> Result<ureq::Response> {
        let mut request = self.agent.get(url);
        if let Some(code) = flight_code {
            request = request.query("codigoVuelo", code);
        }
        Ok(request.call()?)
    }

    fn get_body(&self, url: &str, flight_code: Option<&str>) -> Result<String> {
        self.get(url, flight_code)?
            .into_string()
            .map_err(|e| Error::Network(e.to_string()))
    }
}

impl TicketSource for ApiClient {
    fn fetch_ticket(&self, flight_code: &str) -> Option<TicketDetail> {
        match self.request_ticket(flight_code) {
            Ok(ticket) => Some(ticket),
            Err(Error::NotFound) => {
                warn!(target: "ticket_api", flight_code, "no ticket for flight code");
                None
            }
            Err(e) => {
                error!(target: "ticket_api", flight_code, "ticket lookup failed: {}", e);
                None
            }
        }
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Objects of a top-level array, or of the array under `wrapper_key` when the
/// body is an object. Anything else yields an empty list.
pub fn parse_list(body: &str, wrapper_key: &str) -> Vec<JsonObject> {
    let items = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut obj)) => match obj.remove(wrapper_key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Ok(_) => Vec::new(),
        Err(e) => {
            error!(wrapper_key, "failed to parse response: {}", e);
            Vec::new()
        }
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(obj),
            other => {
                warn!(wrapper_key, "skipping non-object entry: {}", other);
                None
            }
        })
        .collect()
}

/// A ticket from a single object, or the entry of an array whose flight code
/// matches `flight_code`.
pub fn parse_ticket(body: &str, flight_code: &str) -> Result<TicketDetail> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        let obj: JsonObject = serde_json::from_str(trimmed)?;
        Ok(TicketDetail::from_json(&obj))
    } else if trimmed.starts_with('[') {
        let items: Vec<Value> = serde_json::from_str(trimmed)?;
        items
            .iter()
            .filter_map(Value::as_object)
            .find(|obj| crate::models::opt_string(obj, "codigoVuelo") == flight_code)
            .map(TicketDetail::from_json)
            .ok_or(Error::NotFound)
    } else {
        Err(Error::Parse(format!("unexpected response: {}", trimmed)))
    }
}
