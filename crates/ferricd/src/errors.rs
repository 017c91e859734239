use crate::constants::*;
use thiserror::Error;

/// The closed set of RFC 1459 error numerics this server can hand a client.
/// Each variant carries exactly the data its numeric's parameter layout
/// needs; `render` produces the single reply line. Handlers return these
/// instead of writing replies themselves, and the dispatcher renders them
/// uniformly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("no such nick {0}")]
    NoSuchNick(String), // 401
    #[error("no such channel {0}")]
    NoSuchChannel(String), // 403
    #[error("cannot send to channel {0}")]
    CannotSendToChan(String), // 404
    #[error("no recipient given ({0})")]
    NoRecipient(String), // 411
    #[error("no text to send")]
    NoTextToSend, // 412
    #[error("unknown command {0}")]
    UnknownCommand(String), // 421
    #[error("erroneus nickname {0}")]
    ErroneusNickname(String), // 432
    #[error("nickname {0} already in use")]
    NicknameInUse(String), // 433
    #[error("{0} is not on channel {1}")]
    UserNotInChannel(String, String), // 441
    #[error("not on channel {0}")]
    NotOnChannel(String), // 442
    #[error("not registered")]
    NotRegistered, // 451
    #[error("not enough parameters for {0}")]
    NeedMoreParams(String), // 461
    #[error("already registered")]
    AlreadyRegistered, // 462
    #[error("password incorrect")]
    PasswdMismatch, // 464
    #[error("channel {0} is full")]
    ChannelIsFull(String), // 471
    #[error("unknown mode char {0}")]
    UnknownMode(char), // 472
    #[error("channel {0} is invite-only")]
    InviteOnlyChan(String), // 473
    #[error("bad key for channel {0}")]
    BadChannelKey(String), // 475
    #[error("bad channel mask {0}")]
    BadChanMask(String), // 476
    #[error("channel operator privileges needed on {0}")]
    ChanOpPrivsNeeded(String), // 482
    #[error("unknown user mode flag")]
    UModeUnknownFlag, // 501
    #[error("cannot change mode for other users")]
    UsersDontMatch, // 502
}

impl ProtocolError {
    pub fn numeric(&self) -> u16 {
        use ProtocolError::*;
        match self {
            NoSuchNick(_) => ERR_NOSUCHNICK_NB,
            NoSuchChannel(_) => ERR_NOSUCHCHANNEL_NB,
            CannotSendToChan(_) => ERR_CANNOTSENDTOCHAN_NB,
            NoRecipient(_) => ERR_NORECIPIENT_NB,
            NoTextToSend => ERR_NOTEXTTOSEND_NB,
            UnknownCommand(_) => ERR_UNKNOWNCOMMAND_NB,
            ErroneusNickname(_) => ERR_ERRONEUSNICKNAME_NB,
            NicknameInUse(_) => ERR_NICKNAMEINUSE_NB,
            UserNotInChannel(_, _) => ERR_USERNOTINCHANNEL_NB,
            NotOnChannel(_) => ERR_NOTONCHANNEL_NB,
            NotRegistered => ERR_NOTREGISTERED_NB,
            NeedMoreParams(_) => ERR_NEEDMOREPARAMS_NB,
            AlreadyRegistered => ERR_ALREADYREGISTRED_NB,
            PasswdMismatch => ERR_PASSWDMISMATCH_NB,
            ChannelIsFull(_) => ERR_CHANNELISFULL_NB,
            UnknownMode(_) => ERR_UNKNOWNMODE_NB,
            InviteOnlyChan(_) => ERR_INVITEONLYCHAN_NB,
            BadChannelKey(_) => ERR_BADCHANNELKEY_NB,
            BadChanMask(_) => ERR_BADCHANMASK_NB,
            ChanOpPrivsNeeded(_) => ERR_CHANOPRIVSNEEDED_NB,
            UModeUnknownFlag => ERR_UMODEUNKNOWNFLAG_NB,
            UsersDontMatch => ERR_USERSDONTMATCH_NB,
        }
    }

    /// Errors that tear the connection down after the numeric is flushed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolError::PasswdMismatch)
    }

    /// The full reply line, without terminator. `recipient` is the nick of
    /// the offending user, or `*` before one is set.
    pub fn render(&self, server: &str, recipient: &str) -> String {
        use ProtocolError::*;
        let nb = self.numeric();
        let head = format!(":{server} {nb:03} {recipient}");
        match self {
            NoSuchNick(nick) => format!("{head} {nick} :{ERR_NOSUCHNICK_STR}"),
            NoSuchChannel(chan) => format!("{head} {chan} :{ERR_NOSUCHCHANNEL_STR}"),
            CannotSendToChan(chan) => format!("{head} {chan} :{ERR_CANNOTSENDTOCHAN_STR}"),
            NoRecipient(command) => format!("{head} :No recipient given ({command})"),
            NoTextToSend => format!("{head} :{ERR_NOTEXTTOSEND_STR}"),
            UnknownCommand(command) => format!("{head} {command} :{ERR_UNKNOWNCOMMAND_STR}"),
            ErroneusNickname(nick) => format!("{head} {nick} :{ERR_ERRONEUSNICKNAME_STR}"),
            NicknameInUse(nick) => format!("{head} {nick} :{ERR_NICKNAMEINUSE_STR}"),
            UserNotInChannel(nick, chan) => {
                format!("{head} {nick} {chan} :{ERR_USERNOTINCHANNEL_STR}")
            }
            NotOnChannel(chan) => format!("{head} {chan} :{ERR_NOTONCHANNEL_STR}"),
            NotRegistered => format!("{head} :{ERR_NOTREGISTERED_STR}"),
            NeedMoreParams(command) => format!("{head} {command} :{ERR_NEEDMOREPARAMS_STR}"),
            AlreadyRegistered => format!("{head} :{ERR_ALREADYREGISTRED_STR}"),
            PasswdMismatch => format!("{head} :{ERR_PASSWDMISMATCH_STR}"),
            ChannelIsFull(chan) => format!("{head} {chan} :{ERR_CHANNELISFULL_STR}"),
            UnknownMode(flag) => format!("{head} {flag} :{ERR_UNKNOWNMODE_STR}"),
            InviteOnlyChan(chan) => format!("{head} {chan} :{ERR_INVITEONLYCHAN_STR}"),
            BadChannelKey(chan) => format!("{head} {chan} :{ERR_BADCHANNELKEY_STR}"),
            BadChanMask(chan) => format!("{head} {chan} :{ERR_BADCHANMASK_STR}"),
            ChanOpPrivsNeeded(chan) => format!("{head} {chan} :{ERR_CHANOPRIVSNEEDED_STR}"),
            UModeUnknownFlag => format!("{head} :{ERR_UMODEUNKNOWNFLAG_STR}"),
            UsersDontMatch => format!("{head} :{ERR_USERSDONTMATCH_STR}"),
        }
    }
}

/// Why a session ends. Rendered as the QUIT reason peers see and, where a
/// client is still reachable, the trailing of its closing ERROR line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Quit(Option<String>),
    SendQExceeded,
    RecvQExceeded,
    PingTimeout,
    PasswordRejected,
    ConnectionLost,
    ServerShutdown,
}

impl SessionEnd {
    pub fn reason(&self) -> &str {
        match self {
            SessionEnd::Quit(Some(reason)) => reason,
            SessionEnd::Quit(None) => "Client Quit",
            SessionEnd::SendQExceeded => "SendQ exceeded",
            SessionEnd::RecvQExceeded => "RecvQ exceeded",
            SessionEnd::PingTimeout => "Ping timeout",
            SessionEnd::PasswordRejected => "Bad password",
            SessionEnd::ConnectionLost => "Connection reset by peer",
            SessionEnd::ServerShutdown => "Server shutting down",
        }
    }
}

/// Startup and runtime failures of the server process itself, mapped onto
/// the documented exit codes.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("invalid arguments: {0}")]
    BadArgs(String),
    #[error("cannot bind listener: {0}")]
    Bind(#[source] std::io::Error),
    #[error("fatal runtime error: {0}")]
    Fatal(String),
}

impl ServerError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ServerError::BadArgs(_) => 1,
            ServerError::Bind(_) => 2,
            ServerError::Fatal(_) => 3,
        }
    }
}
