//! Scan-to-ticket pipeline.
//!
//! A scan payload (from a camera scanner or a decoded image) is used as the
//! flight code for a ticket lookup. The lookup runs on a blocking background
//! task and the pipeline ends in one of the terminal [`LookupState`]s.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::api::TicketSource;
use crate::codec::{self, ScanSource};
use crate::error::Error;
use crate::models::TicketDetail;

pub const MSG_NOT_FOUND: &str = "No se encontró información para este QR";
pub const MSG_UNREADABLE: &str = "No se pudo leer el QR de la imagen";
pub const MSG_IMAGE_ERROR: &str = "Error al procesar la imagen";
pub const MSG_API_ERROR: &str = "Error al consultar la API";

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    Loading,
    Success(TicketDetail),
    NotFound,
    Error(String),
}

impl LookupState {
    /// Text for the screen's error slot, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::NotFound => Some(MSG_NOT_FOUND),
            Self::Error(msg) => Some(msg),
            Self::Idle | Self::Loading | Self::Success(_) => None,
        }
    }

    /// Hand-off route to the ticket detail view on success.
    pub fn route(&self) -> Option<String> {
        match self {
            Self::Success(ticket) => Some(ticket.to_route()),
            _ => None,
        }
    }
}

pub struct TicketLookup {
    source: Arc<dyn TicketSource>,
    state: LookupState,
    last_payload: Option<String>,
}

impl TicketLookup {
    pub fn new(source: Arc<dyn TicketSource>) -> Self {
        Self {
            source,
            state: LookupState::Idle,
            last_payload: None,
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    /// The payload of the most recent trigger.
    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }

    /// Run a lookup from either scan path.
    pub async fn submit(&mut self, source: ScanSource) -> &LookupState {
        match source {
            ScanSource::Payload(payload) => self.submit_payload(&payload).await,
            ScanSource::ImageFile(path) => self.submit_image(&path).await,
        }
    }

    /// Camera path: the scanner already produced the text. A blank payload is
    /// ignored and leaves the state untouched.
    pub async fn submit_payload(&mut self, payload: &str) -> &LookupState {
        if payload.trim().is_empty() {
            debug!("ignoring blank scan payload");
            return &self.state;
        }
        self.state = LookupState::Loading;
        self.state = self.fetch(payload.to_string(), MSG_API_ERROR).await;
        &self.state
    }

    /// Gallery path: decode the picked image, then look the code up.
    pub async fn submit_image(&mut self, path: &Path) -> &LookupState {
        self.state = LookupState::Loading;

        let image_path = path.to_path_buf();
        let decoded = tokio::task::spawn_blocking(move || codec::decode_image_file(&image_path)).await;

        self.state = match decoded {
            Ok(Ok(payload)) => self.fetch(payload, MSG_IMAGE_ERROR).await,
            Ok(Err(Error::Decode)) => {
                warn!(path = %path.display(), "no readable code in image");
                LookupState::Error(MSG_UNREADABLE.to_string())
            }
            Ok(Err(e)) => {
                error!(path = %path.display(), "failed to process image: {}", e);
                LookupState::Error(MSG_IMAGE_ERROR.to_string())
            }
            Err(e) => {
                error!("image decode task failed: {}", e);
                LookupState::Error(MSG_IMAGE_ERROR.to_string())
            }
        };
        &self.state
    }

    /// `failure` is the message reported if the background task itself fails.
    async fn fetch(&mut self, payload: String, failure: &str) -> LookupState {
        info!(payload = %payload, "looking up ticket");
        self.last_payload = Some(payload.clone());

        let source = Arc::clone(&self.source);
        match tokio::task::spawn_blocking(move || source.fetch_ticket(&payload)).await {
            Ok(Some(ticket)) => LookupState::Success(ticket),
            Ok(None) => LookupState::NotFound,
            Err(e) => {
                error!("ticket lookup task failed: {}", e);
                LookupState::Error(failure.to_string())
            }
        }
    }
}
