//! Link handshake state machine.
//!
//! Tracks an outbound link from the moment our PASS/SERVER go out until the
//! hub acknowledges our burst with `EA`. Lines that are not part of the
//! handshake are passed back as [`HandshakeEvent::Line`] for normal dispatch.

use crate::error::LinkError;
use crate::sync::link::LinkStatus;
use slirc_p10::Message;
use subtle::ConstantTimeEq;

/// What the link should do with one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    /// Nothing to do.
    Ignore,
    /// The hub introduced itself; send our burst.
    ServerAccepted { hub: String, name: String },
    /// The hub finished its burst; answer with `EA`.
    PeerEndOfBurst,
    /// The hub acknowledged our burst; the link is up.
    BurstAcknowledged,
    /// An ordinary line for state and services.
    Line,
}

pub struct HandshakeMachine {
    status: LinkStatus,
    password: String,
    hub: Option<String>,
    hub_name: Option<String>,
}

impl HandshakeMachine {
    /// A machine for a link whose PASS and SERVER have just been sent.
    pub fn new(password: &str) -> Self {
        Self {
            status: LinkStatus::HandshakeSent,
            password: password.to_string(),
            hub: None,
            hub_name: None,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn hub_name(&self) -> Option<&str> {
        self.hub_name.as_deref()
    }

    /// Our `EB` went out.
    pub fn burst_sent(&mut self) {
        if self.status == LinkStatus::AwaitingServerAck {
            self.status = LinkStatus::Bursting;
        }
    }

    pub fn on_line(&mut self, msg: &Message) -> Result<HandshakeEvent, LinkError> {
        if msg.is("ERROR") {
            let reason = msg.last_arg().unwrap_or("no reason given");
            return Err(LinkError::Remote(reason.to_string()));
        }

        match self.status {
            LinkStatus::HandshakeSent => self.before_server(msg),
            LinkStatus::AwaitingServerAck | LinkStatus::Bursting | LinkStatus::Linked => {
                Ok(self.after_server(msg))
            }
            _ => Ok(HandshakeEvent::Ignore),
        }
    }

    fn before_server(&mut self, msg: &Message) -> Result<HandshakeEvent, LinkError> {
        match msg.command.as_str() {
            "PASS" => {
                let offered = msg.last_arg().unwrap_or_default();
                if !bool::from(offered.as_bytes().ct_eq(self.password.as_bytes())) {
                    return Err(LinkError::Handshake("hub sent wrong link password".into()));
                }
                Ok(HandshakeEvent::Ignore)
            }
            "SERVER" => {
                let (Some(name), Some(block)) = (msg.arg(0), msg.arg(5)) else {
                    return Err(LinkError::Handshake("malformed SERVER line".into()));
                };
                let Some(hub) = block.chars().next() else {
                    return Err(LinkError::Handshake("SERVER line without numeric".into()));
                };
                let hub = hub.to_string();
                self.hub = Some(hub.clone());
                self.hub_name = Some(name.to_string());
                self.status = LinkStatus::AwaitingServerAck;
                Ok(HandshakeEvent::ServerAccepted {
                    hub,
                    name: name.to_string(),
                })
            }
            _ => Ok(HandshakeEvent::Ignore),
        }
    }

    fn after_server(&mut self, msg: &Message) -> HandshakeEvent {
        let from_hub = self.hub.as_deref() == Some(msg.source_str());
        match msg.command.as_str() {
            "EB" if from_hub => HandshakeEvent::PeerEndOfBurst,
            "EA" if from_hub && self.status == LinkStatus::Bursting => {
                self.status = LinkStatus::Linked;
                HandshakeEvent::BurstAcknowledged
            }
            "EA" if from_hub => HandshakeEvent::Ignore,
            _ => HandshakeEvent::Line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Message {
        s.parse().unwrap()
    }

    fn accepted() -> HandshakeMachine {
        let mut m = HandshakeMachine::new("linkpass");
        m.on_line(&line("PASS :linkpass")).unwrap();
        m.on_line(&line("SERVER hub.test.net 1 1700000000 1700000100 J10 A]] +h :Test hub"))
            .unwrap();
        m
    }

    #[test]
    fn server_line_names_hub() {
        let mut m = HandshakeMachine::new("linkpass");
        assert_eq!(m.on_line(&line("PASS :linkpass")).unwrap(), HandshakeEvent::Ignore);
        let ev = m
            .on_line(&line("SERVER hub.test.net 1 1700000000 1700000100 J10 A]] +h :Test hub"))
            .unwrap();
        assert_eq!(
            ev,
            HandshakeEvent::ServerAccepted {
                hub: "A".into(),
                name: "hub.test.net".into()
            }
        );
        assert_eq!(m.status(), LinkStatus::AwaitingServerAck);
        assert_eq!(m.hub_name(), Some("hub.test.net"));
    }

    #[test]
    fn wrong_password_fails() {
        let mut m = HandshakeMachine::new("linkpass");
        assert!(matches!(
            m.on_line(&line("PASS :nope")),
            Err(LinkError::Handshake(_))
        ));
    }

    #[test]
    fn short_server_line_fails() {
        let mut m = HandshakeMachine::new("linkpass");
        assert!(m.on_line(&line("SERVER hub.test.net 1")).is_err());
    }

    #[test]
    fn error_line_ends_link() {
        let mut m = accepted();
        let err = m.on_line(&line("ERROR :Closing Link: bad numeric")).unwrap_err();
        assert!(matches!(err, LinkError::Remote(r) if r == "Closing Link: bad numeric"));
    }

    #[test]
    fn burst_exchange() {
        let mut m = accepted();
        assert_eq!(m.on_line(&line("A EB")).unwrap(), HandshakeEvent::PeerEndOfBurst);
        // EA before our EB is sent means nothing.
        assert_eq!(m.on_line(&line("A EA")).unwrap(), HandshakeEvent::Ignore);
        m.burst_sent();
        assert_eq!(m.status(), LinkStatus::Bursting);
        assert_eq!(m.on_line(&line("A EA")).unwrap(), HandshakeEvent::BurstAcknowledged);
        assert_eq!(m.status(), LinkStatus::Linked);
    }

    #[test]
    fn downstream_burst_markers_are_lines() {
        let mut m = accepted();
        m.burst_sent();
        assert_eq!(m.on_line(&line("B EB")).unwrap(), HandshakeEvent::Line);
        assert_eq!(m.on_line(&line("B EA")).unwrap(), HandshakeEvent::Line);
        assert_eq!(m.status(), LinkStatus::Bursting);
    }

    #[test]
    fn lines_before_server_are_ignored() {
        let mut m = HandshakeMachine::new("linkpass");
        assert_eq!(m.on_line(&line("A G :hub")).unwrap(), HandshakeEvent::Ignore);
    }
}
