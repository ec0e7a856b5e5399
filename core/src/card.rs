//! Card operations.
//!
//! A [`BoundCard`] is a [`Card`] record plus a borrow of the [`Session`] that
//! produced it. Every operation issues exactly one request and returns a
//! fresh value built from the service's response; the receiver is never
//! modified, so callers must keep the returned card.

use std::ops::Deref;

use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::session::Session;
use crate::types::{Address, Card, CardStatus, PanAndCvv};

/// A card bound to the session that fetched it.
#[derive(Debug, Clone)]
pub struct BoundCard<'s> {
    card: Card,
    session: &'s Session,
}

impl<'s> BoundCard<'s> {
    pub(crate) fn new(card: Card, session: &'s Session) -> Self {
        Self { card, session }
    }

    /// The session this card was fetched or last refreshed through.
    pub fn session(&self) -> &'s Session {
        self.session
    }

    pub fn card(&self) -> &Card {
        &self.card
    }

    /// Local edits, sent to the service by [`BoundCard::put`].
    pub fn card_mut(&mut self) -> &mut Card {
        &mut self.card
    }

    pub fn into_card(self) -> Card {
        self.card
    }

    fn path(&self, suffix: &str) -> Result<String> {
        let card_id = self.card.card_id.ok_or(Error::MissingCardId)?;
        Ok(format!("/cards/{card_id}{suffix}"))
    }

    fn call(&self, method: HttpMethod, suffix: &str, payload: Option<&Card>) -> Result<BoundCard<'s>> {
        let path = self.path(suffix)?;
        let card = match payload {
            Some(card) => self.session.submit(method, &path, card)?,
            None => self.session.fetch(method, &path)?,
        };
        Ok(self.session.bind(card))
    }

    /// `PUT /cards/{id}` with the full record.
    pub fn put(&self) -> Result<BoundCard<'s>> {
        self.call(HttpMethod::Put, "", Some(&self.card))
    }

    /// `DELETE /cards/{id}`. Returns the card as the service last saw it.
    pub fn delete(&self) -> Result<BoundCard<'s>> {
        self.call(HttpMethod::Delete, "", None)
    }

    /// `POST /cards/{id}/activation`, confirming the printed last four digits.
    pub fn activate(&self, last_four: &str) -> Result<BoundCard<'s>> {
        let mut card = self.card.clone();
        card.last_four = Some(last_four.to_string());
        self.call(HttpMethod::Post, "/activation", Some(&card))
    }

    pub fn turn_on(&self) -> Result<BoundCard<'s>> {
        self.set_status(CardStatus::TurnedOn)
    }

    pub fn turn_off(&self) -> Result<BoundCard<'s>> {
        self.set_status(CardStatus::TurnedOff)
    }

    /// Sends the card with `status` and checks that the service echoed it
    /// back. The service's answer is authoritative: a mismatch is an error
    /// even though the update itself succeeded.
    fn set_status(&self, status: CardStatus) -> Result<BoundCard<'s>> {
        let mut card = self.card.clone();
        card.status = Some(status.clone());
        let updated = self.call(HttpMethod::Put, "", Some(&card))?;
        if updated.status.as_ref() != Some(&status) {
            return Err(Error::UnexpectedState {
                requested: status,
                actual: updated.status.clone(),
            });
        }
        Ok(updated)
    }

    /// `POST /cards/{id}/reissue`
    pub fn reissue(&self) -> Result<BoundCard<'s>> {
        self.call(HttpMethod::Post, "/reissue", None)
    }

    /// `GET /cards/{id}/pan`
    pub fn pan_and_cvv(&self) -> Result<PanAndCvv> {
        self.session.fetch(HttpMethod::Get, &self.path("/pan")?)
    }

    /// `GET /cards/{id}/billingAddress`
    pub fn billing_address(&self) -> Result<Address> {
        self.session
            .fetch(HttpMethod::Get, &self.path("/billingAddress")?)
    }

    /// `POST /cards/{id}/billingAddress`
    pub fn set_billing_address(&self, address: &Address) -> Result<Address> {
        self.session
            .submit(HttpMethod::Post, &self.path("/billingAddress")?, address)
    }

    /// `PUT /cards/{id}/billingAddress`
    pub fn update_billing_address(&self, address: &Address) -> Result<Address> {
        self.session
            .submit(HttpMethod::Put, &self.path("/billingAddress")?, address)
    }
}

impl Deref for BoundCard<'_> {
    type Target = Card;

    fn deref(&self) -> &Card {
        &self.card
    }
}

impl From<BoundCard<'_>> for Card {
    fn from(bound: BoundCard<'_>) -> Self {
        bound.card
    }
}
