use serde::{Deserialize, Serialize};

/// Message-kind codes shared between client and server.
///
/// Every frame carries exactly one intent. The table is partitioned by
/// direction: requests flow client to server, acknowledgements, rejections,
/// errors and pushes flow server to client. Codes the client does not
/// recognize deserialize to [`Intent::Unknown`] and are ignored by the
/// router, so newer servers can add intents without breaking older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    // client => server
    /// Authentication request, sent once per connection after open.
    AuthReq,
    /// Subscription request for a topic.
    SubReq,
    /// Unsubscribe request for a topic.
    UnsReq,
    /// Connection close request.
    CloseReq,
    /// Peer publish: push a message to other subscribers of a topic.
    PubReq,

    // server => client
    /// Connection acknowledged, payload carries the assigned client id.
    ConnAck,
    /// Credentials accepted.
    AuthAck,
    /// Credentials rejected.
    AuthRej,
    /// Authentication error, credentials were already saved.
    AuthErr,
    /// Subscription acknowledged, authorized and subscribed.
    SubAck,
    /// Subscription rejected, unauthorized.
    SubRej,
    /// Subscription error.
    SubErr,
    /// Unsubscribe acknowledged.
    UnsAck,
    /// Unsubscribe rejected.
    UnsRej,
    /// Unsubscribe error.
    UnsErr,
    /// Close acknowledged.
    CloseAck,
    /// Close error.
    CloseErr,
    /// Server did not recognize the intent of a frame we sent.
    IntentErr,
    /// Server could not parse the shape of a frame we sent.
    MsgErr,
    /// Message pushed from the server to this client.
    Msg,
    /// Peer publish acknowledged.
    PubAck,
    /// Peer publish rejected.
    PubRej,
    /// Peer publish error.
    PubErr,

    /// Catch-all for intent codes this client version does not know.
    #[serde(other)]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthReq => "AUTH_REQ",
            Self::SubReq => "SUB_REQ",
            Self::UnsReq => "UNS_REQ",
            Self::CloseReq => "CLOSE_REQ",
            Self::PubReq => "PUB_REQ",
            Self::ConnAck => "CONN_ACK",
            Self::AuthAck => "AUTH_ACK",
            Self::AuthRej => "AUTH_REJ",
            Self::AuthErr => "AUTH_ERR",
            Self::SubAck => "SUB_ACK",
            Self::SubRej => "SUB_REJ",
            Self::SubErr => "SUB_ERR",
            Self::UnsAck => "UNS_ACK",
            Self::UnsRej => "UNS_REJ",
            Self::UnsErr => "UNS_ERR",
            Self::CloseAck => "CLOSE_ACK",
            Self::CloseErr => "CLOSE_ERR",
            Self::IntentErr => "INTENT_ERR",
            Self::MsgErr => "MSG_ERR",
            Self::Msg => "MSG",
            Self::PubAck => "PUB_ACK",
            Self::PubRej => "PUB_REJ",
            Self::PubErr => "PUB_ERR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
