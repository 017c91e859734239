use crate::constants::*;

/// Every line the server originates: numerics carrying the configured
/// server name as prefix, and the structural JOIN/PART/KICK/... shapes
/// relayed with the acting user's `nick!user@host` prefix. `format`
/// assembles exactly one terminator-free line.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<'a> {
    // Connection registration
    Welcome {
        nick: &'a str,
        user: &'a str,
        host: &'a str,
    },
    YourHost {
        nick: &'a str,
        version: &'a str,
    },
    Created {
        nick: &'a str,
        date: &'a str,
    },
    MyInfo {
        nick: &'a str,
        version: &'a str,
        user_modes: &'a str,
        chan_modes: &'a str,
    },
    ISupport {
        nick: &'a str,
        tokens: &'a str,
    },
    MotdStart {
        nick: &'a str,
    },
    Motd {
        nick: &'a str,
        line: &'a str,
    },
    EndOfMotd {
        nick: &'a str,
    },
    NoMotd {
        nick: &'a str,
    },

    // User modes
    UModeIs {
        nick: &'a str,
        modes: &'a str,
    },

    // Channel state
    ChannelModeIs {
        nick: &'a str,
        channel: &'a str,
        modes: &'a str,
    },
    CreationTime {
        nick: &'a str,
        channel: &'a str,
        created_at: u64,
    },
    NoTopic {
        nick: &'a str,
        channel: &'a str,
    },
    TopicIs {
        nick: &'a str,
        channel: &'a str,
        topic: &'a str,
    },
    TopicWhoTime {
        nick: &'a str,
        channel: &'a str,
        setter: &'a str,
        set_at: u64,
    },
    Inviting {
        nick: &'a str,
        target: &'a str,
        channel: &'a str,
    },
    NamReply {
        nick: &'a str,
        channel: &'a str,
        names: &'a str,
    },
    EndOfNames {
        nick: &'a str,
        channel: &'a str,
    },
    EndOfBanList {
        nick: &'a str,
        channel: &'a str,
    },

    // Queries
    WhoisUser {
        nick: &'a str,
        target: &'a str,
        user: &'a str,
        host: &'a str,
        realname: &'a str,
    },
    WhoisServer {
        nick: &'a str,
        target: &'a str,
        info: &'a str,
    },
    WhoisChannels {
        nick: &'a str,
        target: &'a str,
        channels: &'a str,
    },
    EndOfWhois {
        nick: &'a str,
        target: &'a str,
    },
    WhoReply {
        nick: &'a str,
        channel: &'a str,
        user: &'a str,
        host: &'a str,
        target: &'a str,
        flags: &'a str,
        realname: &'a str,
    },
    EndOfWho {
        nick: &'a str,
        mask: &'a str,
    },
    ListStart {
        nick: &'a str,
    },
    ListItem {
        nick: &'a str,
        channel: &'a str,
        visible: usize,
        topic: &'a str,
    },
    ListEnd {
        nick: &'a str,
    },
    Info {
        nick: &'a str,
        line: &'a str,
    },
    EndOfInfo {
        nick: &'a str,
    },
    Version {
        nick: &'a str,
        version: &'a str,
    },

    // Structural messages relayed with a user prefix
    Join {
        prefix: &'a str,
        channel: &'a str,
    },
    Part {
        prefix: &'a str,
        channel: &'a str,
        reason: Option<&'a str>,
    },
    Kick {
        prefix: &'a str,
        channel: &'a str,
        target: &'a str,
        reason: &'a str,
    },
    Quit {
        prefix: &'a str,
        reason: &'a str,
    },
    NickChange {
        prefix: &'a str,
        new_nick: &'a str,
    },
    TopicSet {
        prefix: &'a str,
        channel: &'a str,
        topic: &'a str,
    },
    ModeChange {
        prefix: &'a str,
        target: &'a str,
        modes: &'a str,
    },
    Invite {
        prefix: &'a str,
        target: &'a str,
        channel: &'a str,
    },
    Privmsg {
        prefix: &'a str,
        target: &'a str,
        text: &'a str,
    },
    Notice {
        prefix: &'a str,
        target: &'a str,
        text: &'a str,
    },

    // Housekeeping
    Pong {
        token: &'a str,
    },
    PingProbe {
        cookie: &'a str,
    },
    CapLs {
        nick: &'a str,
    },
    ErrorClosing {
        host: &'a str,
        reason: &'a str,
    },
    ErrorLine {
        text: &'a str,
    },
}

impl<'a> Reply<'a> {
    pub fn format(&self, server: &str) -> String {
        match self {
            // registration burst
            Reply::Welcome { nick, user, host } => format!(
                ":{server} {RPL_WELCOME_NB:03} {nick} :{RPL_WELCOME_STR} {nick}!{user}@{host}"
            ),
            Reply::YourHost { nick, version } => format!(
                ":{server} {RPL_YOURHOST_NB:03} {nick} :Your host is {server}, running version {version}"
            ),
            Reply::Created { nick, date } => format!(
                ":{server} {RPL_CREATED_NB:03} {nick} :This server was created {date}"
            ),
            Reply::MyInfo {
                nick,
                version,
                user_modes,
                chan_modes,
            } => format!(
                ":{server} {RPL_MYINFO_NB:03} {nick} {server} {version} {user_modes} {chan_modes}"
            ),
            Reply::ISupport { nick, tokens } => format!(
                ":{server} {RPL_ISUPPORT_NB:03} {nick} {tokens} :{RPL_ISUPPORT_STR}"
            ),
            Reply::MotdStart { nick } => format!(
                ":{server} {RPL_MOTDSTART_NB:03} {nick} :- {server} Message of the day - "
            ),
            Reply::Motd { nick, line } => {
                format!(":{server} {RPL_MOTD_NB:03} {nick} :- {line}")
            }
            Reply::EndOfMotd { nick } => {
                format!(":{server} {RPL_ENDOFMOTD_NB:03} {nick} :{RPL_ENDOFMOTD_STR}")
            }
            Reply::NoMotd { nick } => {
                format!(":{server} {ERR_NOMOTD_NB:03} {nick} :{ERR_NOMOTD_STR}")
            }

            // user modes
            Reply::UModeIs { nick, modes } => {
                format!(":{server} {RPL_UMODEIS_NB:03} {nick} :{modes}")
            }

            // channel state
            Reply::ChannelModeIs {
                nick,
                channel,
                modes,
            } => format!(":{server} {RPL_CHANNELMODEIS_NB:03} {nick} {channel} {modes}"),
            Reply::CreationTime {
                nick,
                channel,
                created_at,
            } => format!(":{server} {RPL_CREATIONTIME_NB:03} {nick} {channel} {created_at}"),
            Reply::NoTopic { nick, channel } => {
                format!(":{server} {RPL_NOTOPIC_NB:03} {nick} {channel} :{RPL_NOTOPIC_STR}")
            }
            Reply::TopicIs {
                nick,
                channel,
                topic,
            } => format!(":{server} {RPL_TOPIC_NB:03} {nick} {channel} :{topic}"),
            Reply::TopicWhoTime {
                nick,
                channel,
                setter,
                set_at,
            } => format!(":{server} {RPL_TOPICWHOTIME_NB:03} {nick} {channel} {setter} {set_at}"),
            Reply::Inviting {
                nick,
                target,
                channel,
            } => format!(":{server} {RPL_INVITING_NB:03} {nick} {target} {channel}"),
            Reply::NamReply {
                nick,
                channel,
                names,
            } => format!(":{server} {RPL_NAMREPLY_NB:03} {nick} = {channel} :{names}"),
            Reply::EndOfNames { nick, channel } => {
                format!(":{server} {RPL_ENDOFNAMES_NB:03} {nick} {channel} :{RPL_ENDOFNAMES_STR}")
            }
            Reply::EndOfBanList { nick, channel } => format!(
                ":{server} {RPL_ENDOFBANLIST_NB:03} {nick} {channel} :{RPL_ENDOFBANLIST_STR}"
            ),

            // queries
            Reply::WhoisUser {
                nick,
                target,
                user,
                host,
                realname,
            } => format!(
                ":{server} {RPL_WHOISUSER_NB:03} {nick} {target} {user} {host} * :{realname}"
            ),
            Reply::WhoisServer { nick, target, info } => {
                format!(":{server} {RPL_WHOISSERVER_NB:03} {nick} {target} {server} :{info}")
            }
            Reply::WhoisChannels {
                nick,
                target,
                channels,
            } => format!(":{server} {RPL_WHOISCHANNELS_NB:03} {nick} {target} :{channels}"),
            Reply::EndOfWhois { nick, target } => {
                format!(":{server} {RPL_ENDOFWHOIS_NB:03} {nick} {target} :{RPL_ENDOFWHOIS_STR}")
            }
            Reply::WhoReply {
                nick,
                channel,
                user,
                host,
                target,
                flags,
                realname,
            } => format!(
                ":{server} {RPL_WHOREPLY_NB:03} {nick} {channel} {user} {host} {server} {target} {flags} :0 {realname}"
            ),
            Reply::EndOfWho { nick, mask } => {
                format!(":{server} {RPL_ENDOFWHO_NB:03} {nick} {mask} :{RPL_ENDOFWHO_STR}")
            }
            Reply::ListStart { nick } => {
                format!(":{server} {RPL_LISTSTART_NB:03} {nick} {RPL_LISTSTART_STR}")
            }
            Reply::ListItem {
                nick,
                channel,
                visible,
                topic,
            } => format!(":{server} {RPL_LIST_NB:03} {nick} {channel} {visible} :{topic}"),
            Reply::ListEnd { nick } => {
                format!(":{server} {RPL_LISTEND_NB:03} {nick} :{RPL_LISTEND_STR}")
            }
            Reply::Info { nick, line } => {
                format!(":{server} {RPL_INFO_NB:03} {nick} :{line}")
            }
            Reply::EndOfInfo { nick } => {
                format!(":{server} {RPL_ENDOFINFO_NB:03} {nick} :{RPL_ENDOFINFO_STR}")
            }
            Reply::Version { nick, version } => {
                format!(":{server} {RPL_VERSION_NB:03} {nick} {version} {server} :")
            }

            // structural relays
            Reply::Join { prefix, channel } => format!(":{prefix} JOIN {channel}"),
            Reply::Part {
                prefix,
                channel,
                reason,
            } => match reason {
                Some(reason) => format!(":{prefix} PART {channel} :{reason}"),
                None => format!(":{prefix} PART {channel}"),
            },
            Reply::Kick {
                prefix,
                channel,
                target,
                reason,
            } => format!(":{prefix} KICK {channel} {target} :{reason}"),
            Reply::Quit { prefix, reason } => format!(":{prefix} QUIT :{reason}"),
            Reply::NickChange { prefix, new_nick } => format!(":{prefix} NICK :{new_nick}"),
            Reply::TopicSet {
                prefix,
                channel,
                topic,
            } => format!(":{prefix} TOPIC {channel} :{topic}"),
            Reply::ModeChange {
                prefix,
                target,
                modes,
            } => format!(":{prefix} MODE {target} {modes}"),
            Reply::Invite {
                prefix,
                target,
                channel,
            } => format!(":{prefix} INVITE {target} :{channel}"),
            Reply::Privmsg {
                prefix,
                target,
                text,
            } => format!(":{prefix} PRIVMSG {target} :{text}"),
            Reply::Notice {
                prefix,
                target,
                text,
            } => format!(":{prefix} NOTICE {target} :{text}"),

            // housekeeping
            Reply::Pong { token } => format!(":{server} PONG {server} :{token}"),
            Reply::PingProbe { cookie } => format!("PING :{cookie}"),
            Reply::CapLs { nick } => format!(":{server} CAP {nick} LS :"),
            Reply::ErrorClosing { host, reason } => {
                format!("ERROR :Closing Link: {host} ({reason})")
            }
            Reply::ErrorLine { text } => format!("ERROR :{text}"),
        }
    }
}
