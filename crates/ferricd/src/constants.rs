// RFC 1459, 6. REPLIES
//
// Numeric codes and their canonical text, kept in pairs so the reply and
// error renderers never hardcode a digit string.

// 001    RPL_WELCOME
//        "Welcome to the Internet Relay Network <nick>!<user>@<host>"
pub const RPL_WELCOME_NB: u16 = 1;
pub const RPL_WELCOME_STR: &'static str = "Welcome to the Internet Relay Network";

// 002    RPL_YOURHOST
//        "Your host is <servername>, running version <ver>"
pub const RPL_YOURHOST_NB: u16 = 2;

// 003    RPL_CREATED
//        "This server was created <date>"
pub const RPL_CREATED_NB: u16 = 3;

// 004    RPL_MYINFO
//        "<servername> <version> <available user modes> <available channel modes>"
pub const RPL_MYINFO_NB: u16 = 4;

// 005    RPL_ISUPPORT (de-facto extension; "are supported by this server")
pub const RPL_ISUPPORT_NB: u16 = 5;
pub const RPL_ISUPPORT_STR: &'static str = "are supported by this server";

// 221    RPL_UMODEIS
//        "<user mode string>"
pub const RPL_UMODEIS_NB: u16 = 221;

// 311    RPL_WHOISUSER
//        "<nick> <user> <host> * :<real name>"
pub const RPL_WHOISUSER_NB: u16 = 311;

// 312    RPL_WHOISSERVER
//        "<nick> <server> :<server info>"
pub const RPL_WHOISSERVER_NB: u16 = 312;

// 315    RPL_ENDOFWHO
//        "<name> :End of /WHO list"
pub const RPL_ENDOFWHO_NB: u16 = 315;
pub const RPL_ENDOFWHO_STR: &'static str = "End of /WHO list";

// 318    RPL_ENDOFWHOIS
//        "<nick> :End of /WHOIS list"
pub const RPL_ENDOFWHOIS_NB: u16 = 318;
pub const RPL_ENDOFWHOIS_STR: &'static str = "End of /WHOIS list";

// 319    RPL_WHOISCHANNELS
//        "<nick> :{[@|+]<channel><space>}"
pub const RPL_WHOISCHANNELS_NB: u16 = 319;

// 321    RPL_LISTSTART
//        "Channel :Users  Name"
pub const RPL_LISTSTART_NB: u16 = 321;
pub const RPL_LISTSTART_STR: &'static str = "Channel :Users  Name";

// 322    RPL_LIST
//        "<channel> <# visible> :<topic>"
pub const RPL_LIST_NB: u16 = 322;

// 323    RPL_LISTEND
//        ":End of /LIST"
pub const RPL_LISTEND_NB: u16 = 323;
pub const RPL_LISTEND_STR: &'static str = "End of /LIST";

// 324    RPL_CHANNELMODEIS
//        "<channel> <mode> <mode params>"
pub const RPL_CHANNELMODEIS_NB: u16 = 324;

// 329    RPL_CREATIONTIME (de-facto extension)
//        "<channel> <creation time>"
pub const RPL_CREATIONTIME_NB: u16 = 329;

// 331    RPL_NOTOPIC
//        "<channel> :No topic is set"
pub const RPL_NOTOPIC_NB: u16 = 331;
pub const RPL_NOTOPIC_STR: &'static str = "No topic is set";

// 332    RPL_TOPIC
//        "<channel> :<topic>"
pub const RPL_TOPIC_NB: u16 = 332;

// 333    RPL_TOPICWHOTIME (de-facto extension)
//        "<channel> <setter> <set at>"
pub const RPL_TOPICWHOTIME_NB: u16 = 333;

// 341    RPL_INVITING
//        "<channel> <nick>"
pub const RPL_INVITING_NB: u16 = 341;

// 351    RPL_VERSION
//        "<version>.<debuglevel> <server> :<comments>"
pub const RPL_VERSION_NB: u16 = 351;

// 352    RPL_WHOREPLY
//        "<channel> <user> <host> <server> <nick> <H|G>[*][@|+] :<hopcount> <real name>"
pub const RPL_WHOREPLY_NB: u16 = 352;

// 353    RPL_NAMREPLY
//        "<channel> :[[@|+]<nick> [[@|+]<nick> [...]]]"
pub const RPL_NAMREPLY_NB: u16 = 353;

// 366    RPL_ENDOFNAMES
//        "<channel> :End of /NAMES list"
pub const RPL_ENDOFNAMES_NB: u16 = 366;
pub const RPL_ENDOFNAMES_STR: &'static str = "End of /NAMES list";

// 368    RPL_ENDOFBANLIST
//        "<channel> :End of channel ban list"
pub const RPL_ENDOFBANLIST_NB: u16 = 368;
pub const RPL_ENDOFBANLIST_STR: &'static str = "End of channel ban list";

// 371    RPL_INFO
//        ":<string>"
pub const RPL_INFO_NB: u16 = 371;

// 372    RPL_MOTD
//        ":- <text>"
pub const RPL_MOTD_NB: u16 = 372;

// 374    RPL_ENDOFINFO
//        ":End of /INFO list"
pub const RPL_ENDOFINFO_NB: u16 = 374;
pub const RPL_ENDOFINFO_STR: &'static str = "End of /INFO list";

// 375    RPL_MOTDSTART
//        ":- <server> Message of the day - "
pub const RPL_MOTDSTART_NB: u16 = 375;

// 376    RPL_ENDOFMOTD
//        ":End of /MOTD command"
pub const RPL_ENDOFMOTD_NB: u16 = 376;
pub const RPL_ENDOFMOTD_STR: &'static str = "End of /MOTD command";

// 401    ERR_NOSUCHNICK
//        "<nickname> :No such nick/channel"
pub const ERR_NOSUCHNICK_NB: u16 = 401;
pub const ERR_NOSUCHNICK_STR: &'static str = "No such nick/channel";

// 403    ERR_NOSUCHCHANNEL
//        "<channel name> :No such channel"
pub const ERR_NOSUCHCHANNEL_NB: u16 = 403;
pub const ERR_NOSUCHCHANNEL_STR: &'static str = "No such channel";

// 404    ERR_CANNOTSENDTOCHAN
//        "<channel name> :Cannot send to channel"
pub const ERR_CANNOTSENDTOCHAN_NB: u16 = 404;
pub const ERR_CANNOTSENDTOCHAN_STR: &'static str = "Cannot send to channel";

// 411    ERR_NORECIPIENT
//        ":No recipient given (<command>)"
pub const ERR_NORECIPIENT_NB: u16 = 411;

// 412    ERR_NOTEXTTOSEND
//        ":No text to send"
pub const ERR_NOTEXTTOSEND_NB: u16 = 412;
pub const ERR_NOTEXTTOSEND_STR: &'static str = "No text to send";

// 421    ERR_UNKNOWNCOMMAND
//        "<command> :Unknown command"
pub const ERR_UNKNOWNCOMMAND_NB: u16 = 421;
pub const ERR_UNKNOWNCOMMAND_STR: &'static str = "Unknown command";

// 422    ERR_NOMOTD
//        ":MOTD File is missing"
pub const ERR_NOMOTD_NB: u16 = 422;
pub const ERR_NOMOTD_STR: &'static str = "MOTD File is missing";

// 432    ERR_ERRONEUSNICKNAME
//        "<nick> :Erroneus nickname"
pub const ERR_ERRONEUSNICKNAME_NB: u16 = 432;
pub const ERR_ERRONEUSNICKNAME_STR: &'static str = "Erroneus nickname";

// 433    ERR_NICKNAMEINUSE
//        "<nick> :Nickname is already in use"
pub const ERR_NICKNAMEINUSE_NB: u16 = 433;
pub const ERR_NICKNAMEINUSE_STR: &'static str = "Nickname is already in use";

// 441    ERR_USERNOTINCHANNEL
//        "<nick> <channel> :They aren't on that channel"
pub const ERR_USERNOTINCHANNEL_NB: u16 = 441;
pub const ERR_USERNOTINCHANNEL_STR: &'static str = "They aren't on that channel";

// 442    ERR_NOTONCHANNEL
//        "<channel> :You're not on that channel"
pub const ERR_NOTONCHANNEL_NB: u16 = 442;
pub const ERR_NOTONCHANNEL_STR: &'static str = "You're not on that channel";

// 451    ERR_NOTREGISTERED
//        ":You have not registered"
pub const ERR_NOTREGISTERED_NB: u16 = 451;
pub const ERR_NOTREGISTERED_STR: &'static str = "You have not registered";

// 461    ERR_NEEDMOREPARAMS
//        "<command> :Not enough parameters"
pub const ERR_NEEDMOREPARAMS_NB: u16 = 461;
pub const ERR_NEEDMOREPARAMS_STR: &'static str = "Not enough parameters";

// 462    ERR_ALREADYREGISTRED
//        ":You may not reregister"
pub const ERR_ALREADYREGISTRED_NB: u16 = 462;
pub const ERR_ALREADYREGISTRED_STR: &'static str = "You may not reregister";

// 464    ERR_PASSWDMISMATCH
//        ":Password incorrect"
pub const ERR_PASSWDMISMATCH_NB: u16 = 464;
pub const ERR_PASSWDMISMATCH_STR: &'static str = "Password incorrect";

// 471    ERR_CHANNELISFULL
//        "<channel> :Cannot join channel (+l)"
pub const ERR_CHANNELISFULL_NB: u16 = 471;
pub const ERR_CHANNELISFULL_STR: &'static str = "Cannot join channel (+l)";

// 472    ERR_UNKNOWNMODE
//        "<char> :is unknown mode char to me"
pub const ERR_UNKNOWNMODE_NB: u16 = 472;
pub const ERR_UNKNOWNMODE_STR: &'static str = "is unknown mode char to me";

// 473    ERR_INVITEONLYCHAN
//        "<channel> :Cannot join channel (+i)"
pub const ERR_INVITEONLYCHAN_NB: u16 = 473;
pub const ERR_INVITEONLYCHAN_STR: &'static str = "Cannot join channel (+i)";

// 475    ERR_BADCHANNELKEY
//        "<channel> :Cannot join channel (+k)"
pub const ERR_BADCHANNELKEY_NB: u16 = 475;
pub const ERR_BADCHANNELKEY_STR: &'static str = "Cannot join channel (+k)";

// 476    ERR_BADCHANMASK
//        "<channel> :Bad Channel Mask"
pub const ERR_BADCHANMASK_NB: u16 = 476;
pub const ERR_BADCHANMASK_STR: &'static str = "Bad Channel Mask";

// 482    ERR_CHANOPRIVSNEEDED
//        "<channel> :You're not channel operator"
pub const ERR_CHANOPRIVSNEEDED_NB: u16 = 482;
pub const ERR_CHANOPRIVSNEEDED_STR: &'static str = "You're not channel operator";

// 501    ERR_UMODEUNKNOWNFLAG
//        ":Unknown MODE flag"
pub const ERR_UMODEUNKNOWNFLAG_NB: u16 = 501;
pub const ERR_UMODEUNKNOWNFLAG_STR: &'static str = "Unknown MODE flag";

// 502    ERR_USERSDONTMATCH
//        ":Cant change mode for other users"
pub const ERR_USERSDONTMATCH_NB: u16 = 502;
pub const ERR_USERSDONTMATCH_STR: &'static str = "Cant change mode for other users";
