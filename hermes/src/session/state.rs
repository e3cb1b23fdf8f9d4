use std::fmt;

/// Session lifecycle. Moves strictly forward; `Closed` is reachable from every state and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    AwaitingHandshake,
    StreamsSent,
    AwaitingSelection,
    Connected,
    ChannelsSent,
    Streaming,
    Closed,
}

impl SessionState {
    /// The state that follows on the normal path.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::AwaitingHandshake => Some(Self::StreamsSent),
            Self::StreamsSent => Some(Self::AwaitingSelection),
            Self::AwaitingSelection => Some(Self::Connected),
            Self::Connected => Some(Self::ChannelsSent),
            Self::ChannelsSent => Some(Self::Streaming),
            Self::Streaming => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    pub fn can_advance_to(self, next: Self) -> bool {
        match next {
            Self::Closed => self != Self::Closed,
            _ => self.successor() == Some(next),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingHandshake => "awaiting-handshake",
            Self::StreamsSent => "streams-sent",
            Self::AwaitingSelection => "awaiting-selection",
            Self::Connected => "connected",
            Self::ChannelsSent => "channels-sent",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}
