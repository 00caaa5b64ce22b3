//! Inventory request adapter.
//!
//! # Responsibility
//! - Parse request payloads and parameters for the inventory resources.
//! - Call `PartsRepository` and shape replies as status + JSON body.
//!
//! # Invariants
//! - Failure replies carry `ErrorKind::public_message` only.
//! - Missing payload keys read as empty strings.

use crate::db::ConnectionProvider;
use crate::mapping::QueryResult;
use crate::outcome::{ErrorKind, OperationOutcome};
use crate::repo::parts_repo::PartsRepository;
use log::{error, warn};
use serde_json::{json, Map, Value};

pub const CONTENT_TYPE_JSON: &str = "application/json";

const KEY_TITLE: &str = "PC_PARTS_TITLE";
const KEY_CODE: &str = "PC_PARTS_CODE";
const KEY_MAKER: &str = "PC_PARTS_MAKER";
const KEY_AVAIL: &str = "PC_PARTS_AVAIL";
const KEY_DESC: &str = "PC_PARTS_DESC";

const MSG_INSERTED: &str = "Item has been entered successfully";
const MSG_MISSING_BRAND: &str = "Error: please specify brand for this search";
const MSG_BAD_ITEM_NUMBER: &str = "Error: item number must be an integer";
const MSG_BAD_PAYLOAD: &str = "Error: request body must be a JSON object";

/// Transport-neutral reply. The body is always `application/json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn message(status: u16, message: &str) -> Self {
        let body = json!([{ "HTTP_CODE": status.to_string(), "MSG": message }]);
        Self {
            status,
            body: body.to_string(),
        }
    }

    fn failure(kind: ErrorKind) -> Self {
        Self::message(kind.http_status(), kind.public_message())
    }

    fn records(result: &QueryResult) -> Self {
        match result.to_json_string() {
            Ok(body) => Self { status: 200, body },
            Err(err) => {
                error!(
                    "event=api_reply module=service status=error error_kind=unknown error={}",
                    err
                );
                Self::failure(ErrorKind::Unknown)
            }
        }
    }

    fn from_query(outcome: OperationOutcome<QueryResult>) -> Self {
        match outcome {
            Ok(result) => Self::records(&result),
            Err(failure) => Self::failure(failure.kind),
        }
    }
}

/// Inventory resource handlers over one repository.
pub struct InventoryService<P: ConnectionProvider> {
    repo: PartsRepository<P>,
}

impl<P: ConnectionProvider> InventoryService<P> {
    pub fn new(repo: PartsRepository<P>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &PartsRepository<P> {
        &self.repo
    }

    /// Handles a new-part payload.
    ///
    /// # Contract
    /// - Body must be a JSON object; other JSON or malformed text → 400.
    /// - Non-string values are used in their JSON text form.
    /// - Success → 200 with a confirmation message.
    pub fn add_part(&self, payload: &str) -> ApiReply {
        let fields = match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) | Err(_) => {
                warn!("event=api_add_part module=service status=rejected reason=bad_payload");
                return ApiReply::message(400, MSG_BAD_PAYLOAD);
            }
        };

        let outcome = self.repo.insert_part(
            &opt_string(&fields, KEY_TITLE),
            &opt_string(&fields, KEY_CODE),
            &opt_string(&fields, KEY_MAKER),
            &opt_string(&fields, KEY_AVAIL),
            &opt_string(&fields, KEY_DESC),
        );

        match outcome {
            Ok(()) => ApiReply::message(200, MSG_INSERTED),
            Err(failure) => ApiReply::failure(failure.kind),
        }
    }

    /// Parts of one brand; the brand parameter is required.
    pub fn brand_parts(&self, brand: Option<&str>) -> ApiReply {
        match required_brand(brand) {
            Some(brand) => ApiReply::from_query(self.repo.find_by_brand(brand)),
            None => ApiReply::message(400, MSG_MISSING_BRAND),
        }
    }

    /// One brand's parts filtered by item number given as path text.
    pub fn brand_item(&self, brand: &str, item_number: &str) -> ApiReply {
        let Some(brand) = required_brand(Some(brand)) else {
            return ApiReply::message(400, MSG_MISSING_BRAND);
        };
        match item_number.trim().parse::<i64>() {
            Ok(code) => ApiReply::from_query(self.repo.find_by_brand_and_code(brand, code)),
            Err(_) => ApiReply::message(400, MSG_BAD_ITEM_NUMBER),
        }
    }

    pub fn all_parts(&self) -> ApiReply {
        ApiReply::from_query(self.repo.list_all())
    }

    pub fn check_db(&self) -> ApiReply {
        ApiReply::from_query(self.repo.check_liveness())
    }
}

/// Brand parameters are trimmed; blank means absent.
fn required_brand(brand: Option<&str>) -> Option<&str> {
    brand.map(str::trim).filter(|brand| !brand.is_empty())
}

fn opt_string(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
    }
}
