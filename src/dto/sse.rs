use serde::Serialize;

/// Named event with a JSON body, fanned out to every SSE subscriber.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE event name.
    pub event: &'static str,
    /// Serialized JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Serialize `payload` under the given event name.
    pub fn new(event: &'static str, payload: &impl Serialize) -> serde_json::Result<Self> {
        Ok(Self {
            event,
            data: serde_json::to_string(payload)?,
        })
    }
}
