//! Wire records exchanged with the host.
//!
//! Seeds come in from the document evaluator, update envelopes from the
//! host's `processUpdate` path, and fetch request events go out through the
//! engine's event channel. Field names follow the wire format exactly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::EnvelopeError;
use super::identity::{CorrelationToken, ListId, PageToken};

/// Event kind under which fetch requests are surfaced to the host.
pub const EVENT_KIND_FETCH_REQUEST: &str = "DataSourceFetchRequest";

/// Initial binding of a dynamic source, as found in the document data.
#[derive(Clone, Debug)]
pub struct Seed {
    pub source_type: String,
    pub list_id: ListId,
    /// The seed's distinguished cursor. Echoed back by the host and used to
    /// route the pre-registered backward page (see the provider's
    /// correlation-less acceptance rule).
    pub page_token: PageToken,
    pub forward_page_token: Option<PageToken>,
    pub backward_page_token: Option<PageToken>,
    pub items: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeed {
    #[serde(rename = "type")]
    source_type: Option<String>,
    list_id: Option<String>,
    page_token: Option<String>,
    #[serde(default)]
    forward_page_token: Option<String>,
    #[serde(default)]
    backward_page_token: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

impl Seed {
    pub fn decode(payload: &Value) -> Result<Self, EnvelopeError> {
        if !payload.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }
        let raw = RawSeed::deserialize(payload)
            .map_err(|err| EnvelopeError::Decode(err.to_string()))?;

        let source_type = raw
            .source_type
            .ok_or(EnvelopeError::MissingField("type"))?;
        let list_id = ListId::parse(raw.list_id.ok_or(EnvelopeError::MissingField("listId"))?)?;
        let page_token =
            PageToken::parse(raw.page_token.ok_or(EnvelopeError::MissingField("pageToken"))?)?;

        Ok(Self {
            source_type,
            list_id,
            page_token,
            forward_page_token: PageToken::parse_optional(raw.forward_page_token),
            backward_page_token: PageToken::parse_optional(raw.backward_page_token),
            items: raw.items,
        })
    }
}

/// A lazy-load response pushed in by the host.
#[derive(Clone, Debug)]
pub struct UpdateEnvelope {
    /// Carried for host-side routing, never validated. The wire has used
    /// both `presentationToken` and `token` for this field.
    pub presentation_token: Option<String>,
    pub list_id: ListId,
    pub correlation_token: Option<CorrelationToken>,
    pub page_token: PageToken,
    /// `None` closes the frontier in the direction being extended.
    pub next_page_token: Option<PageToken>,
    pub items: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUpdate {
    #[serde(default, alias = "token")]
    presentation_token: Option<String>,
    list_id: Option<String>,
    #[serde(default)]
    correlation_token: Option<String>,
    page_token: Option<String>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    items: Vec<Value>,
}

impl UpdateEnvelope {
    pub fn decode(payload: &Value) -> Result<Self, EnvelopeError> {
        if !payload.is_object() {
            return Err(EnvelopeError::NotAnObject);
        }
        let raw = RawUpdate::deserialize(payload)
            .map_err(|err| EnvelopeError::Decode(err.to_string()))?;

        let list_id = ListId::parse(raw.list_id.ok_or(EnvelopeError::MissingField("listId"))?)?;
        let page_token =
            PageToken::parse(raw.page_token.ok_or(EnvelopeError::MissingField("pageToken"))?)?;
        let correlation_token = match raw.correlation_token {
            Some(raw) => Some(CorrelationToken::parse(&raw)?),
            None => None,
        };

        Ok(Self {
            presentation_token: raw.presentation_token,
            list_id,
            correlation_token,
            page_token,
            next_page_token: PageToken::parse_optional(raw.next_page_token),
            items: raw.items,
        })
    }
}

/// Outbound fetch request, delivered on the engine's event channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FetchRequestEvent {
    /// The configured source type tag.
    pub name: String,
    pub value: FetchRequestValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequestValue {
    pub list_id: ListId,
    pub correlation_token: CorrelationToken,
    pub page_token: PageToken,
}

impl FetchRequestEvent {
    pub fn kind(&self) -> &'static str {
        EVENT_KIND_FETCH_REQUEST
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn seed_decodes_with_optional_frontiers() {
        let seed = Seed::decode(&json!({
            "type": "dynamicTokenList",
            "listId": "vQdpOESlok",
            "pageToken": "pageToken",
            "forwardPageToken": "forwardPageToken",
            "backwardPageToken": "",
            "items": [10, 11, 12]
        }))
        .unwrap();

        assert_eq!(seed.list_id.as_str(), "vQdpOESlok");
        assert_eq!(seed.forward_page_token.unwrap().as_str(), "forwardPageToken");
        assert!(seed.backward_page_token.is_none());
        assert_eq!(seed.items.len(), 3);
    }

    #[test]
    fn seed_requires_list_id_and_page_token() {
        let err = Seed::decode(&json!({
            "type": "dynamicTokenList",
            "listId": "vQdpOESlok",
            "items": [10]
        }))
        .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("pageToken"));

        let err = Seed::decode(&json!({
            "type": "dynamicTokenList",
            "pageToken": "pageToken"
        }))
        .unwrap_err();
        assert_eq!(err, EnvelopeError::MissingField("listId"));
    }

    #[test]
    fn update_accepts_token_alias_and_closes_on_empty_next() {
        let update = UpdateEnvelope::decode(&json!({
            "token": "presentationToken",
            "listId": "vQdpOESlok",
            "correlationToken": "101",
            "pageToken": "forwardPageToken",
            "nextPageToken": "",
            "items": [15, 16]
        }))
        .unwrap();

        assert_eq!(update.presentation_token.as_deref(), Some("presentationToken"));
        assert_eq!(update.correlation_token, Some(CorrelationToken::new(101)));
        assert!(update.next_page_token.is_none());
    }

    #[test]
    fn update_without_correlation_or_items_decodes() {
        let update = UpdateEnvelope::decode(&json!({
            "listId": "vQdpOESlok",
            "pageToken": "pageToken"
        }))
        .unwrap();
        assert!(update.correlation_token.is_none());
        assert!(update.items.is_empty());
    }

    #[test]
    fn null_payload_is_not_an_object() {
        assert_eq!(
            UpdateEnvelope::decode(&Value::Null).unwrap_err(),
            EnvelopeError::NotAnObject
        );
    }

    #[test]
    fn fetch_request_serializes_correlation_as_string() {
        let event = FetchRequestEvent {
            name: "dynamicTokenList".to_string(),
            value: FetchRequestValue {
                list_id: ListId::parse("vQdpOESlok").unwrap(),
                correlation_token: CorrelationToken::new(101),
                page_token: PageToken::parse("forwardPageToken").unwrap(),
            },
        };
        assert_eq!(event.kind(), EVENT_KIND_FETCH_REQUEST);
        let encoded = serde_json::to_value(&event).unwrap();
        assert_eq!(encoded["value"]["correlationToken"], json!("101"));
        assert_eq!(encoded["value"]["pageToken"], json!("forwardPageToken"));
    }
}
