/// Blueprint metadata loading with stale-response protection
///
/// The loader never performs I/O itself. It hands out a [`FetchRequest`] per blueprint identity
/// change, a host executes it on whatever transport it has, and the outcome is fed back through
/// [`DataLoader::accept`]. Each request carries a generation-tagged [`FetchTicket`]; only the
/// ticket of the latest request is accepted, so late responses for an older identity are dropped.
use std::fmt;

use crate::error::FetchError;
use crate::metadata::{BlueprintId, BlueprintMetadata};

/// Bearer token supplied by the host
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Credential(token.into())
    }

    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Identifies one issued fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub id: BlueprintId,
}

/// Everything a transport needs to run one metadata fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub url: String,
    pub credential: Option<Credential>,
}

impl FetchRequest {
    /// Run the request on a blocking transport
    pub fn execute<C: BlueprintClient + ?Sized>(&self, client: &C) -> FetchOutcome {
        let result = client
            .get_blueprint(&self.url, self.credential.as_ref())
            .and_then(|body| BlueprintMetadata::from_json(&body));
        FetchOutcome {
            ticket: self.ticket.clone(),
            result,
        }
    }
}

/// Result of a fetch, tagged with the ticket it was issued under
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub ticket: FetchTicket,
    pub result: Result<BlueprintMetadata, FetchError>,
}

/// Transport seam for `GET /blueprint/{id}`; returns the raw response body
pub trait BlueprintClient {
    fn get_blueprint(&self, url: &str, credential: Option<&Credential>)
        -> Result<String, FetchError>;
}

/// Issues at most one live fetch and recognises stale outcomes
#[derive(Debug)]
pub struct DataLoader {
    api_base_url: String,
    credential: Option<Credential>,
    generation: u64,
    in_flight: Option<FetchTicket>,
}

impl DataLoader {
    pub fn new(api_base_url: impl Into<String>, credential: Option<Credential>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            credential,
            generation: 0,
            in_flight: None,
        }
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }

    /// Start a fetch for `id`; any request still in flight becomes stale
    pub fn request(&mut self, id: &BlueprintId) -> FetchRequest {
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            id: id.clone(),
        };
        self.in_flight = Some(ticket.clone());
        tracing::debug!(blueprint = %id, generation = self.generation, "issuing metadata fetch");
        FetchRequest {
            ticket,
            url: format!("{}/blueprint/{}", self.api_base_url.trim_end_matches('/'), id),
            credential: self.credential.clone(),
        }
    }

    /// Drop interest in the in-flight fetch, if any
    pub fn invalidate(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(blueprint = %ticket.id, generation = ticket.generation, "fetch invalidated");
        }
    }

    /// Whether `ticket` is the live request; consumes it when it is
    pub fn accept(&mut self, ticket: &FetchTicket) -> bool {
        if self.in_flight.as_ref() == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }
}
