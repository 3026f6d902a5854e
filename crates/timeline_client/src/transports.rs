use std::sync::Arc;

use agent_transport::{AgentTransport, TransportInitError};
use agent_transport_mock::{MockTransport, MOCK_TRANSPORT_ID};

pub const AVAILABLE_TRANSPORTS: [&str; 1] = [MOCK_TRANSPORT_ID];

pub fn transport_for_id(transport_id: &str) -> Result<Arc<dyn AgentTransport>, TransportInitError> {
    match transport_id {
        MOCK_TRANSPORT_ID => Ok(Arc::new(MockTransport::default())),
        unknown => Err(TransportInitError::UnsupportedTransport {
            requested: unknown.to_string(),
            available: AVAILABLE_TRANSPORTS.join(", "),
        }),
    }
}
