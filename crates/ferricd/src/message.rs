use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::alpha1,
    combinator::opt,
    sequence::preceded,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// https://www.rfc-editor.org/rfc/rfc1459
// 2.3.1 Message format in 'pseudo' BNF
//
//    The protocol messages must be extracted from the contiguous stream of
//    octets. The current solution is to designate two characters, CR and
//    LF, as message separators. Empty messages are silently ignored,
//    which permits use of the sequence CR-LF between messages without
//    extra problems.
//
//    <message>  ::= [':' <prefix> <SPACE> ] <command> <params> <crlf>
//    <prefix>   ::= <servername> | <nick> [ '!' <user> ] [ '@' <host> ]
//    <command>  ::= <letter> { <letter> } | <number> <number> <number>
//    <SPACE>    ::= ' ' { ' ' }
//    <params>   ::= <SPACE> [ ':' <trailing> | <middle> <params> ]
//
//    <middle>   ::= <Any *non-empty* sequence of octets not including SPACE
//                   or NUL or CR or LF, the first of which may not be ':'>
//    <trailing> ::= <Any, possibly *empty*, sequence of octets not including
//                   NUL or CR or LF>
//
//    Most protocol messages specify additional semantics and syntax for
//    the extracted parameter strings dictated by their position in the
//    message.

/// Hard cap from RFC 1459, 2.3: 512 octets including the trailing CRLF.
pub const MAX_LINE_LEN: usize = 512;
/// Line content before the terminator.
pub const MAX_CONTENT_LEN: usize = MAX_LINE_LEN - 2;
/// At most 15 parameters, the last of which may be a trailing.
pub const MAX_PARAMS: usize = 15;
/// Unterminated bytes a connection may accumulate before it is torn down.
pub const RECVQ_MAX: usize = 4096;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Blank input between CRLF pairs; discarded without a reply.
    #[error("empty message")]
    Empty,
    #[error("parsing error: {0}")]
    ParseError(&'static str),
}

/// One parsed IRC line. `command` is uppercased on parse; `params` holds
/// the middles and `trailing` the final space-capable parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl Message {
    /// Middles plus trailing, as commands count their arguments.
    pub fn arg_count(&self) -> usize {
        self.params.len() + usize::from(self.trailing.is_some())
    }

    /// Positional argument lookup where the trailing is the last argument.
    pub fn arg(&self, idx: usize) -> Option<&str> {
        if idx < self.params.len() {
            self.params.get(idx).map(String::as_str)
        } else if idx == self.params.len() {
            self.trailing.as_deref()
        } else {
            None
        }
    }

    /// Canonical wire form, CRLF-terminated.
    pub fn to_line(&self) -> String {
        let mut out = String::with_capacity(64);
        if let Some(prefix) = &self.prefix {
            out.push(':');
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(&self.command);
        for param in &self.params {
            out.push(' ');
            out.push_str(param);
        }
        if let Some(trailing) = &self.trailing {
            out.push_str(" :");
            out.push_str(trailing);
        }
        out.push_str("\r\n");
        out
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.to_line();
        f.write_str(line.trim_end_matches(['\r', '\n']))
    }
}

// <prefix> up to the first SPACE; its inner structure is not interpreted
// for client-sourced messages.
fn prefix_parser(input: &str) -> IResult<&str, &str> {
    preceded(tag(":"), take_while1(|c: char| c != ' ')).parse(input)
}

// <command> ::= <letter> { <letter> } | <number> <number> <number>
fn command_parser(input: &str) -> IResult<&str, &str> {
    alt((alpha1, take_while_m_n(3, 3, |c: char| c.is_ascii_digit()))).parse(input)
}

impl FromStr for Message {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(MessageError::Empty);
        }

        let (rest, prefix) =
            opt(prefix_parser).parse(line).map_err(|_| MessageError::ParseError("prefix"))?;
        let rest = if prefix.is_some() {
            rest.strip_prefix(' ').ok_or(MessageError::ParseError("space after prefix"))?
        } else {
            rest
        };

        let (mut rest, command) =
            command_parser(rest).map_err(|_| MessageError::ParseError("command"))?;
        if !rest.is_empty() && !rest.starts_with(' ') {
            return Err(MessageError::ParseError("command token"));
        }

        let mut params = Vec::new();
        let mut trailing = None;
        while let Some(stripped) = rest.strip_prefix(' ') {
            rest = stripped;
            if rest.is_empty() {
                break;
            }
            if let Some(t) = rest.strip_prefix(':') {
                trailing = Some(t.to_owned());
                rest = "";
            } else if params.len() == MAX_PARAMS - 1 {
                // The 15th parameter absorbs the remainder, colon or not.
                trailing = Some(rest.to_owned());
                rest = "";
            } else {
                let end = rest.find(' ').unwrap_or(rest.len());
                params.push(rest[..end].to_owned());
                rest = &rest[end..];
            }
        }

        Ok(Message {
            prefix: prefix.map(str::to_owned),
            command: command.to_ascii_uppercase(),
            params,
            trailing,
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("read buffer exceeded {RECVQ_MAX} bytes without a line terminator")]
    RecvQExceeded,
}

/// Per-connection read buffer. Bytes are appended as they arrive; complete
/// lines come out once a terminator shows up. CRLF terminates a line and a
/// bare LF is tolerated. Overlong lines are cut to `MAX_CONTENT_LEN` before
/// they reach the parser.
#[derive(Debug, Default)]
pub struct ReadBuffer {
    buf: Vec<u8>,
}

impl ReadBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, FramingError> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.buf.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if raw.len() > MAX_CONTENT_LEN {
                raw.truncate(MAX_CONTENT_LEN);
            }
            match String::from_utf8(raw) {
                Ok(line) => lines.push(line),
                Err(e) => log::debug!("dropping non-UTF-8 line: {e}"),
            }
        }

        if self.buf.len() > RECVQ_MAX {
            return Err(FramingError::RecvQExceeded);
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Message {
        s.parse().unwrap_or_else(|e| panic!("should parse {s:?}: {e}"))
    }

    #[test]
    fn parses_command_only() {
        let m = parse("QUIT");
        assert_eq!(m.command, "QUIT");
        assert!(m.prefix.is_none());
        assert!(m.params.is_empty());
        assert!(m.trailing.is_none());
    }

    #[test]
    fn parses_params_and_trailing() {
        let m = parse("PRIVMSG #chat :hello there");
        assert_eq!(m.command, "PRIVMSG");
        assert_eq!(m.params, vec!["#chat"]);
        assert_eq!(m.trailing.as_deref(), Some("hello there"));
        assert_eq!(m.arg_count(), 2);
        assert_eq!(m.arg(1), Some("hello there"));
    }

    #[test]
    fn parses_prefix() {
        let m = parse(":alice!alice@host PRIVMSG bob :hi");
        assert_eq!(m.prefix.as_deref(), Some("alice!alice@host"));
        assert_eq!(m.command, "PRIVMSG");
    }

    #[test]
    fn command_is_uppercased() {
        assert_eq!(parse("join #a").command, "JOIN");
        assert_eq!(parse("353").command, "353");
    }

    #[test]
    fn rejects_bad_command_tokens() {
        assert!("12 x".parse::<Message>().is_err());
        assert!("1234".parse::<Message>().is_err());
        assert!("PRIV@MSG x".parse::<Message>().is_err());
    }

    #[test]
    fn empty_lines_are_discarded() {
        assert_eq!("".parse::<Message>(), Err(MessageError::Empty));
        assert_eq!("   ".parse::<Message>(), Err(MessageError::Empty));
    }

    #[test]
    fn empty_trailing_is_kept() {
        let m = parse("TOPIC #chat :");
        assert_eq!(m.trailing.as_deref(), Some(""));
        assert_eq!(m.arg_count(), 2);
    }

    #[test]
    fn fifteenth_param_absorbs_remainder() {
        let middles = (0..14).map(|i| format!("p{i}")).collect::<Vec<_>>().join(" ");
        let m = parse(&format!("CMD {middles} rest of the line"));
        assert_eq!(m.params.len(), 14);
        assert_eq!(m.trailing.as_deref(), Some("rest of the line"));
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let m = Message {
            prefix: Some("server.example".to_owned()),
            command: "353".to_owned(),
            params: vec!["alice".to_owned(), "=".to_owned(), "#chat".to_owned()],
            trailing: Some("@alice bob".to_owned()),
        };
        assert_eq!(m.to_line().parse::<Message>().unwrap(), m);
    }

    #[test]
    fn parse_then_serialize_is_identity() {
        for line in [
            "PING :irc.example.net\r\n",
            ":alice!a@h JOIN #chat\r\n",
            "MODE #chat +kl secret 10\r\n",
        ] {
            assert_eq!(line.parse::<Message>().unwrap().to_line(), line);
        }
    }

    #[test]
    fn read_buffer_reassembles_partial_lines() {
        let mut rb = ReadBuffer::new();
        assert!(rb.push(b"NICK al").unwrap().is_empty());
        assert_eq!(rb.push(b"ice\r\nUSER ").unwrap(), vec!["NICK alice"]);
        assert_eq!(rb.push(b"a 0 * :A\r\n").unwrap(), vec!["USER a 0 * :A"]);
    }

    #[test]
    fn read_buffer_tolerates_bare_lf() {
        let mut rb = ReadBuffer::new();
        assert_eq!(rb.push(b"PING x\nPING y\r\n").unwrap(), vec!["PING x", "PING y"]);
    }

    #[test]
    fn oversized_line_is_truncated_to_content_cap() {
        let mut rb = ReadBuffer::new();
        // 513 bytes on the wire: 511 of content + CRLF.
        let long = format!("PRIVMSG #c :{}", "x".repeat(499));
        assert_eq!(long.len(), 511);
        let lines = rb.push(format!("{long}\r\n").as_bytes()).unwrap();
        assert_eq!(lines[0].len(), MAX_CONTENT_LEN);
        assert!(lines[0].parse::<Message>().is_ok());

        // Exactly 512 on the wire passes through untouched.
        let mut rb = ReadBuffer::new();
        let exact = format!("PRIVMSG #c :{}", "y".repeat(498));
        assert_eq!(exact.len(), MAX_CONTENT_LEN);
        assert_eq!(rb.push(format!("{exact}\r\n").as_bytes()).unwrap(), vec![exact]);
    }

    #[test]
    fn unterminated_flood_overflows() {
        let mut rb = ReadBuffer::new();
        assert!(rb.push(&[b'a'; RECVQ_MAX]).is_ok());
        assert_eq!(rb.push(b"bcd"), Err(FramingError::RecvQExceeded));
    }
}
