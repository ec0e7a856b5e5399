//! Authenticated session: bootstrap, dispatch and account-level operations.
//!
//! # Design
//! `Session` is created once per credential pair by exchanging the key pair
//! for a bearer token (`POST /sessions`). Every later call goes through
//! [`Session::dispatch`], which attaches the token, writes diagnostic lines,
//! validates that the body is JSON and turns error envelopes into
//! [`Error::Business`]. Resource operations only build paths and decode.
//!
//! Cards come back as [`BoundCard`]s borrowing the session, so card-level
//! operations never need the session passed again.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::BoundCard;
use crate::classify::classify_value;
use crate::config::{Credentials, Environment, SessionConfig};
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, Transport, UreqTransport};
use crate::sink::{DiagnosticSink, Discard};
use crate::types::{ApiApplication, Business, Card, CardType, Transactions};

const SESSIONS_PATH: &str = "/sessions";

/// Sent as `lastFour` when creating a card; the service assigns the real
/// digits in its response.
const PLACEHOLDER_LAST_FOUR: u16 = 3215;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    access_key: &'a str,
    secret_key: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCardRequest<'a> {
    #[serde(rename = "type")]
    card_type: CardType,
    alias: &'a str,
    virtual_card: bool,
    last_four: u16,
}

/// Authenticated context for one base URL and one bearer token.
pub struct Session {
    base_url: String,
    authorization: String,
    application: ApiApplication,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Session {
    /// Opens a session against the production API.
    pub fn production(access_key: &str, secret_key: &str) -> Result<Self> {
        Self::obtain(
            &Environment::Production.into(),
            &Credentials::new(access_key, secret_key),
        )
    }

    /// Opens a session against the sandbox API.
    pub fn sandbox(access_key: &str, secret_key: &str) -> Result<Self> {
        Self::obtain(
            &Environment::Sandbox.into(),
            &Credentials::new(access_key, secret_key),
        )
    }

    /// Opens a session using the production `ureq` transport.
    pub fn obtain(config: &SessionConfig, credentials: &Credentials) -> Result<Self> {
        Self::obtain_with(config, credentials, UreqTransport::new(config.timeout))
    }

    /// Exchanges `credentials` for a bearer token through `transport`.
    ///
    /// Fails with [`Error::InvalidResponse`] when the body is not JSON and
    /// with [`Error::MissingAuthToken`] when the `Authorization` header is
    /// absent. A body that is JSON but not an application descriptor is
    /// tolerated.
    pub fn obtain_with(
        config: &SessionConfig,
        credentials: &Credentials,
        transport: impl Transport + 'static,
    ) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let body = serde_json::to_vec(&SessionRequest {
            access_key: &credentials.access_key,
            secret_key: &credentials.secret_key,
        })
        .map_err(Error::Encode)?;

        let request = HttpRequest {
            method: HttpMethod::Post,
            path: SESSIONS_PATH.to_string(),
            url: format!("{base_url}{SESSIONS_PATH}"),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
            ],
            body: Some(body),
        };

        tracing::debug!(%base_url, access_key = %credentials.access_key, "requesting session token");
        let response = transport.send(&request)?;
        let value = parse_json(&response.body)?;

        let Some(authorization) = response.header("Authorization") else {
            if let Some(err) = classify_value(&value) {
                tracing::warn!(reason = err.message(), code = err.code(), "session request rejected");
            }
            return Err(Error::MissingAuthToken);
        };
        let authorization = authorization.to_string();

        let application = ApiApplication::deserialize(&value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "session response is not an application descriptor");
            ApiApplication::default()
        });
        tracing::debug!(application = ?application.name, "session established");

        Ok(Self {
            base_url,
            authorization,
            application,
            transport: Arc::new(transport),
            sink: Arc::new(Discard),
        })
    }

    /// Builds a session around a token obtained elsewhere.
    pub fn with_token(
        base_url: &str,
        authorization: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization: authorization.into(),
            application: ApiApplication::default(),
            transport: Arc::new(transport),
            sink: Arc::new(Discard),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token sent as `Authorization` on every call.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Application descriptor returned at bootstrap; empty for sessions
    /// built with [`Session::with_token`].
    pub fn application(&self) -> &ApiApplication {
        &self.application
    }

    /// Replaces the diagnostic sink.
    pub fn set_sink(&mut self, sink: impl DiagnosticSink + 'static) {
        self.sink = Arc::new(sink);
    }

    /// Replaces the transport used for subsequent calls.
    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Arc::new(transport);
    }

    /// Issues one authenticated call and returns the raw response body.
    ///
    /// The body is guaranteed to be valid JSON that is not an error
    /// envelope.
    pub fn dispatch<P>(&self, method: HttpMethod, path: &str, payload: Option<&P>) -> Result<Vec<u8>>
    where
        P: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.base_url);
        let body = payload
            .map(serde_json::to_vec)
            .transpose()
            .map_err(Error::Encode)?;

        let mut headers = Vec::with_capacity(3);
        if let Some(body) = &body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            self.sink.line(&format!(
                "Sending request: [method: {method}] [uri: {url}] body: {}",
                String::from_utf8_lossy(body)
            ));
        } else {
            self.sink
                .line(&format!("Sending request: [method: {method}] [uri: {url}]"));
        }
        headers.push(("Accept".to_string(), "*/*".to_string()));
        headers.push(("Authorization".to_string(), self.authorization.clone()));

        let request = HttpRequest {
            method,
            path: path.to_string(),
            url,
            headers,
            body,
        };
        let response = self.transport.send(&request)?;
        self.sink.line(&format!(
            "Received response: [status: {}] {}",
            response.status,
            String::from_utf8_lossy(&response.body)
        ));
        tracing::debug!(%method, path, status = response.status, "bento call completed");

        let value = parse_json(&response.body)?;
        if let Some(err) = classify_value(&value) {
            return Err(err.into());
        }
        Ok(response.body)
    }

    pub(crate) fn fetch<T: DeserializeOwned>(&self, method: HttpMethod, path: &str) -> Result<T> {
        let body = self.dispatch::<()>(method, path, None)?;
        decode(&body)
    }

    pub(crate) fn submit<P, T>(&self, method: HttpMethod, path: &str, payload: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.dispatch(method, path, Some(payload))?;
        decode(&body)
    }

    pub(crate) fn bind(&self, card: Card) -> BoundCard<'_> {
        BoundCard::new(card, self)
    }

    /// `GET /businesses/me`
    pub fn get_business(&self) -> Result<Business> {
        self.fetch(HttpMethod::Get, "/businesses/me")
    }

    /// `GET /cards`
    pub fn get_cards(&self) -> Result<Vec<BoundCard<'_>>> {
        let cards: Vec<Card> = self.fetch(HttpMethod::Get, "/cards")?;
        Ok(cards.into_iter().map(|card| self.bind(card)).collect())
    }

    /// `GET /cards/{id}`
    pub fn get_card(&self, card_id: i64) -> Result<BoundCard<'_>> {
        let card = self.fetch(HttpMethod::Get, &format!("/cards/{card_id}"))?;
        Ok(self.bind(card))
    }

    /// `POST /cards`. Creates a physical card of `card_type`.
    pub fn new_card(&self, card_type: CardType, alias: &str) -> Result<BoundCard<'_>> {
        let request = NewCardRequest {
            card_type,
            alias,
            virtual_card: false,
            last_four: PLACEHOLDER_LAST_FOUR,
        };
        let card = self.submit(HttpMethod::Post, "/cards", &request)?;
        Ok(self.bind(card))
    }

    /// `GET /transactions`
    pub fn get_transactions(&self) -> Result<Transactions> {
        self.fetch(HttpMethod::Get, "/transactions")
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("application", &self.application.name)
            .finish_non_exhaustive()
    }
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|_| Error::InvalidResponse {
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(Error::Decode)
}
