use tokio::sync::mpsc;

/// Cap on queued outbound lines per connection. Lines are at most 512
/// bytes, so 128 queued lines bound the send-q at 64 KiB.
pub const SENDQ_LINES: usize = 128;

/// What the broker hands a connection's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Line(String),
    /// Write nothing further; flush what was queued ahead of this and
    /// close the socket.
    Shutdown,
}

impl Outbound {
    /// Outbound lines are CRLF-terminated, always.
    pub fn line(line: impl Into<String>) -> Self {
        let mut raw: String = line.into();
        if !raw.ends_with("\r\n") {
            raw.push_str("\r\n");
        }
        Outbound::Line(raw)
    }
}

pub type OutboundTx = mpsc::Sender<Outbound>;
pub type OutboundRx = mpsc::Receiver<Outbound>;

pub fn outbound_channel() -> (OutboundTx, OutboundRx) {
    mpsc::channel(SENDQ_LINES)
}
