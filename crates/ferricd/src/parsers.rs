use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::satisfy,
    combinator::{recognize, verify},
    sequence::pair,
};

// https://www.rfc-editor.org/rfc/rfc1459
// 2.3.1 Message format in 'pseudo' BNF
//
//    <nick>       ::= <letter> { <letter> | <number> | <special> }
//    <channel>    ::= ('#' | '&') <chstring>
//    <chstring>   ::= <any 8bit code except SPACE, BELL, NUL, CR, LF and
//                      comma (',')>
//    <letter>     ::= 'a' ... 'z' | 'A' ... 'Z'
//    <number>     ::= '0' ... '9'
//    <special>    ::= '-' | '[' | ']' | '\' | '`' | '^' | '{' | '}'
//
// 1.2 Clients: nicknames have a maximum length of nine (9) characters.
// 1.3 Channels: names are strings of length up to 50 characters.
//
// The '_' and '|' specials are accepted as well, matching what every
// deployed client generates.

fn is_nickname_special(c: char) -> bool {
    "[]\\`_^{|}".contains(c)
}

fn is_nickname_first_char(c: char) -> bool {
    c.is_ascii_alphabetic() || is_nickname_special(c)
}

fn is_nickname_tail_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || is_nickname_special(c)
}

pub fn nickname_parser(input: &str) -> IResult<&str, &str> {
    let first = satisfy(is_nickname_first_char);
    let tail = take_while(is_nickname_tail_char);
    // Enforce max length = 9; the first-char rule rules out the empty string.
    verify(recognize(pair(first, tail)), |s: &str| s.len() <= 9).parse(input)
}

/// Full-input nickname check, as NICK validation wants it.
pub fn is_valid_nickname(input: &str) -> bool {
    matches!(nickname_parser(input), Ok(("", _)))
}

fn is_chstring_char(c: char) -> bool {
    !matches!(c, ' ' | ',' | '\x07') && !c.is_control()
}

pub fn channel_parser(input: &str) -> IResult<&str, &str> {
    let parser = recognize(pair(
        alt((tag("#"), tag("&"))),
        take_while1(is_chstring_char),
    ));
    verify(parser, |s: &str| s.len() <= 50).parse(input)
}

/// Full-input channel-name check, as JOIN validation wants it.
pub fn is_valid_channel_name(input: &str) -> bool {
    matches!(channel_parser(input), Ok(("", _)))
}

/// True for `#`/`&` targets; used to split PRIVMSG/MODE target forms.
pub fn is_channel_target(input: &str) -> bool {
    input.starts_with('#') || input.starts_with('&')
}

//    <key> ::= any 7-bit US_ASCII character, except NUL, CR, LF, FF, h/v
//              TABs and " "; maximum length 23 (RFC 1459, 4.2.3.1)
fn is_key_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && c != ' '
}

pub fn key_parser(input: &str) -> IResult<&str, &str> {
    verify(take_while1(is_key_char), |s: &str| s.len() <= 23).parse(input)
}

pub fn is_valid_key(input: &str) -> bool {
    matches!(key_parser(input), Ok(("", _)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_nicknames() {
        let cases = [
            "a",
            "alice",
            "Z9",
            "x-y",
            "t[est]",
            "g{ood}",
            "h\\i",
            "j`k",
            "m^n",
            "under_score",
            "[nine9ch]",
        ];
        for &case in &cases {
            assert!(is_valid_nickname(case), "should accept: {case}");
        }
    }

    #[test]
    fn invalid_nicknames() {
        let cases = [
            "",            // empty
            "1abc",        // cannot start with digit
            "-dash",       // cannot start with '-'
            "tencharssz",  // length 10
            "with space",  // space
            "exclaim!",    // '!' not allowed
        ];
        for &case in &cases {
            assert!(!is_valid_nickname(case), "should reject: {case}");
        }
    }

    #[test]
    fn nickname_boundary_is_nine() {
        assert!(is_valid_nickname("ninechars"));
        assert!(!is_valid_nickname("ninechars9"));
    }

    #[test]
    fn valid_channel_names() {
        for &case in &["#chat", "&local", "#a", "#with.dots", "#st[range]"] {
            assert!(is_valid_channel_name(case), "should accept: {case}");
        }
    }

    #[test]
    fn invalid_channel_names() {
        let cases = [
            "",
            "#",              // no chstring
            "chat",           // missing prefix
            "+modeless",      // unsupported prefix
            "#with space",
            "#with,comma",
            "#ctrl\x01char",
        ];
        for &case in &cases {
            assert!(!is_valid_channel_name(case), "should reject: {case}");
        }
        let long = format!("#{}", "c".repeat(50));
        assert_eq!(long.len(), 51);
        assert!(!is_valid_channel_name(&long));
        assert!(is_valid_channel_name(&long[..50]));
    }

    #[test]
    fn keys() {
        assert!(is_valid_key("secret"));
        assert!(is_valid_key("s3cr3t!"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("has space"));
        assert!(!is_valid_key(&"k".repeat(24)));
    }
}
