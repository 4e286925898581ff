//! Flight ticket lookup and boarding-pass export.
//!
//! Browse flights, turn a scanned or uploaded QR code into a ticket lookup
//! against the flights API, and write the ticket out as a PDF boarding pass.

pub mod api;
pub mod codec;
pub mod config;
pub mod date;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod pdf;

pub use api::{ApiClient, TicketSource};
pub use config::Config;
pub use error::{Error, Result};
pub use lookup::{LookupState, TicketLookup};
pub use models::{FlightSummary, PassengerRecord, TicketDetail};
