use filechat_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// Breaks the stream with an error of the given kind.
    #[serde(rename = "failure")]
    Failure(ErrorKind),
}

/// The preset response for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request is rejected before any event is streamed.
    pub rejection: Option<ErrorKind>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetResponse` that streams the given text fragments.
    #[inline]
    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            fragments
                .into_iter()
                .map(|s| PresetEvent::MessageDelta(s.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` whose request is rejected with `kind`.
    #[inline]
    pub fn rejected(kind: ErrorKind) -> Self {
        Self {
            events: vec![],
            rejection: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response = PresetResponse::with_events([
            PresetEvent::MessageDelta("Looking at your file".to_string()),
            PresetEvent::Failure(ErrorKind::RateLimitExceeded),
        ]);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
    }

    #[test]
    fn test_with_fragments() {
        let response = PresetResponse::with_fragments(["Hel", "lo"]);
        assert_eq!(
            response.events,
            vec![
                PresetEvent::MessageDelta("Hel".to_owned()),
                PresetEvent::MessageDelta("lo".to_owned()),
            ]
        );
        assert_eq!(response.rejection, None);
    }
}
