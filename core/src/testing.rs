//! Fixtures and scripted transports shared by unit tests.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;

pub(crate) const SAMPLE_BUSINESS: &str = r#"{
  "businessId": 12345,
  "companyName": "My Company Inc",
  "nameOnCard": "My Company",
  "phone": "9998881234",
  "accountNumber": "820187766",
  "businessStructure": "LLC",
  "status": "APPROVED",
  "createdDate": 1495759408,
  "approvalDate": 1495759408,
  "approvalStatus": "Approved",
  "balance": 100.99,
  "timeZone": "America/Los_Angeles",
  "addresses": [
    {
      "active": true,
      "addressType": "BUSINESS_ADDRESS",
      "city": "San Francisco",
      "id": 12345,
      "state": "CA",
      "street": "123 Main Street",
      "zipCode": "94123"
    }
  ]
}"#;

pub(crate) const SAMPLE_CARD: &str = r#"{
  "cardId": 12345,
  "type": "CategoryCard",
  "lifecycleStatus": "ACTIVATED",
  "status": "TURNED_ON",
  "expiration": "1221",
  "lastFour": "1234",
  "virtualCard": false,
  "alias": "My Card",
  "availableAmount": 123.45,
  "allowedDays": ["MONDAY"],
  "allowedCategoriesActive": true,
  "allowedCategories": [{"transactionCategoryId": 10}],
  "createdOn": 1495759408,
  "updatedOn": 1495759408,
  "spendingLimit": {
    "active": true,
    "amount": 123.45,
    "period": "Day",
    "customStartDate": 1495759408,
    "customEndDate": 1495759408
  },
  "user": {
    "firstName": "John",
    "lastName": "Smith",
    "birthDate": 1495759408,
    "email": "me@myemail.com",
    "phone": "9998887654",
    "userId": 12345,
    "mobileAccess": true,
    "deleted": false,
    "created": 1495759408
  }
}"#;

pub(crate) const SAMPLE_ADDRESS: &str = r#"{
  "active": true,
  "addressType": "USER_ADDRESS",
  "city": "Oakland",
  "id": 55,
  "state": "CA",
  "street": "1 Broadway",
  "zipCode": "94607"
}"#;

pub(crate) const SAMPLE_TRANSACTIONS: &str = r#"{
  "amount": 42.5,
  "size": 1,
  "cardTransactions": [
    {
      "cardTransactionId": 777,
      "amount": 42.5,
      "currency": "USD",
      "status": "SETTLED",
      "payee": {"name": "Coffee Shop", "city": "San Francisco", "country": "US"}
    }
  ]
}"#;

/// Canned responses keyed by (method, path), shaped after the live API.
pub(crate) fn sample_routes(method: HttpMethod, path: &str) -> Option<String> {
    let body = match (method, path) {
        (_, "/businesses/me") => SAMPLE_BUSINESS.to_string(),
        (HttpMethod::Get, "/cards") => format!("[{SAMPLE_CARD},{SAMPLE_CARD}]"),
        (HttpMethod::Post, "/cards") => SAMPLE_CARD.to_string(),
        (_, "/cards/12345") => SAMPLE_CARD.to_string(),
        (_, "/cards/12345/activation") | (_, "/cards/12345/reissue") => SAMPLE_CARD.to_string(),
        (HttpMethod::Get, "/cards/12345/pan") => r#"{"pan":"4111111111111234","cvv":"987"}"#.to_string(),
        (_, "/cards/12345/billingAddress") => SAMPLE_ADDRESS.to_string(),
        (HttpMethod::Get, "/transactions") => SAMPLE_TRANSACTIONS.to_string(),
        _ => return None,
    };
    Some(body)
}

pub(crate) type Requests = Arc<Mutex<Vec<HttpRequest>>>;

/// A session whose transport records every request and answers from
/// `routes`; unknown routes fail at the transport level.
pub(crate) fn recording_session<F>(routes: F) -> (Session, Requests)
where
    F: Fn(HttpMethod, &str) -> Option<String> + Send + Sync + 'static,
{
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);
    let transport = move |request: &HttpRequest| -> Result<HttpResponse> {
        recorded.lock().unwrap().push(request.clone());
        routes(request.method, &request.path)
            .map(HttpResponse::ok)
            .ok_or_else(|| Error::transport("no such testing endpoint"))
    };
    let session = Session::with_token("http://bento.test", "test-token", transport);
    (session, requests)
}
