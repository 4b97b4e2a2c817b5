//! Constructors for the outbound lines a services server sends.
//!
//! Every function takes the sending numeric first. Free text always goes out
//! in trailing form.

use crate::message::Message;
use crate::numeric::NULL_IP;

/// Protocol tag advertised in our `SERVER` line.
pub const PROTOCOL: &str = "J10";

/// Client capacity advertised after our server numeric.
pub const CAPACITY: &str = "]]]";

fn text(source: &str, command: &str, mut params: Vec<String>, text: &str) -> Message {
    params.push(text.to_owned());
    Message::new(Some(source), command, params)
}

fn plain(source: &str, command: &str, params: &[&str]) -> Message {
    Message::plain(Some(source), command, params.iter().copied())
}

/// `PASS :<password>`
pub fn pass(password: &str) -> Message {
    Message::new(None::<String>, "PASS", [password])
}

/// `SERVER <name> 1 <start> <now> J10 <numeric>]]] +s6 :<description>`
pub fn server(name: &str, numeric: &str, start: i64, now: i64, description: &str) -> Message {
    Message::new(
        None::<String>,
        "SERVER",
        [
            name.to_owned(),
            "1".to_owned(),
            start.to_string(),
            now.to_string(),
            PROTOCOL.to_owned(),
            format!("{}{}", numeric, CAPACITY),
            "+s6".to_owned(),
            description.to_owned(),
        ],
    )
}

/// Parameters of a pseudo-client introduction.
#[derive(Debug, Clone)]
pub struct Introduction<'a> {
    pub nick: &'a str,
    pub ident: &'a str,
    pub host: &'a str,
    pub modes: &'a str,
    pub numeric: &'a str,
    pub description: &'a str,
    pub timestamp: i64,
}

/// `<server> N <nick> 1 <ts> <ident> <host> <modes> AAAAAA <numeric> :<description>`
pub fn nick_intro(server: &str, intro: &Introduction<'_>) -> Message {
    text(
        server,
        "N",
        vec![
            intro.nick.to_owned(),
            "1".to_owned(),
            intro.timestamp.to_string(),
            intro.ident.to_owned(),
            intro.host.to_owned(),
            intro.modes.to_owned(),
            NULL_IP.to_owned(),
            intro.numeric.to_owned(),
        ],
        intro.description,
    )
}

/// `<server> EB`
pub fn end_of_burst(server: &str) -> Message {
    plain(server, "EB", &[])
}

/// `<server> EA`
pub fn eob_ack(server: &str) -> Message {
    plain(server, "EA", &[])
}

/// `<numeric> C <channel> <ts>`
pub fn create(numeric: &str, channel: &str, ts: i64) -> Message {
    plain(numeric, "C", &[channel, &ts.to_string()])
}

/// `<numeric> J <channel> <ts>`
pub fn join(numeric: &str, channel: &str, ts: i64) -> Message {
    plain(numeric, "J", &[channel, &ts.to_string()])
}

/// `<numeric> L <channel>`
pub fn part(numeric: &str, channel: &str) -> Message {
    plain(numeric, "L", &[channel])
}

/// `<source> M <target> <modes> [args...]`
pub fn mode(source: &str, target: &str, modes: &str, args: &[&str]) -> Message {
    let mut params = vec![target, modes];
    params.extend_from_slice(args);
    plain(source, "M", &params)
}

/// `<numeric> K <channel> <target> :<reason>`
pub fn kick(numeric: &str, channel: &str, target: &str, reason: &str) -> Message {
    text(numeric, "K", vec![channel.to_owned(), target.to_owned()], reason)
}

/// `<numeric> P <target> :<text>`
pub fn privmsg(numeric: &str, target: &str, body: &str) -> Message {
    text(numeric, "P", vec![target.to_owned()], body)
}

/// `<numeric> O <target> :<text>`
pub fn notice(numeric: &str, target: &str, body: &str) -> Message {
    text(numeric, "O", vec![target.to_owned()], body)
}

/// Answer a `G` with a `Z` echoing its arguments.
pub fn pong(server: &str, ping: &Message) -> Message {
    Message {
        source: Some(server.to_owned()),
        command: "Z".to_owned(),
        params: ping.params.clone(),
        trailing: ping.trailing,
    }
}

/// `<server> AC <numeric> <account>`
pub fn account(server: &str, numeric: &str, account: &str) -> Message {
    plain(server, "AC", &[numeric, account])
}

/// `<server> FA <numeric> <host>`
pub fn fakehost(server: &str, numeric: &str, host: &str) -> Message {
    plain(server, "FA", &[numeric, host])
}

/// `<server> SASL <target> <tag> <mode> [data]`
pub fn sasl(server: &str, target: &str, tag: &str, mode: &str, data: Option<&str>) -> Message {
    let mut params = vec![target, tag, mode];
    params.extend(data);
    plain(server, "SASL", &params)
}

/// `<server> SQ <name> 0 :<reason>`
pub fn squit(server: &str, name: &str, reason: &str) -> Message {
    text(server, "SQ", vec![name.to_owned(), "0".to_owned()], reason)
}
