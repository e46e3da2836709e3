use serde::{Deserialize, Serialize};

/// Delivery guarantees for a data channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reliability {
    #[default]
    Reliable,
    Unreliable,
    ReliableUnordered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChannelOptions {
    pub ordered: Option<bool>,
    pub max_retransmits: Option<u16>,
    pub max_packet_life_time: Option<u16>,
    pub protocol: Option<String>,
    /// Pre-agreed stream id; set when both sides create the channel themselves.
    pub negotiated_id: Option<u16>,
}

impl DataChannelOptions {
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    pub fn negotiated(mut self, id: u16) -> Self {
        self.negotiated_id = Some(id);
        self
    }
}

impl From<Reliability> for DataChannelOptions {
    fn from(reliability: Reliability) -> Self {
        match reliability {
            Reliability::Reliable => Self {
                ordered: Some(true),
                ..Default::default()
            },
            Reliability::Unreliable => Self {
                ordered: Some(false),
                max_retransmits: Some(0),
                ..Default::default()
            },
            Reliability::ReliableUnordered => Self {
                ordered: Some(false),
                ..Default::default()
            },
        }
    }
}
