//! Command parser
//!
//! Parses raw command lines into [`Command`]s. The verb is case-insensitive;
//! a path is always the last argument and runs to the end of the line, so
//! it may contain spaces, trailing ones included. Only the line ending is
//! stripped.

use crate::protocol::Command;

/// Parses a raw command string received from a client into the `Command` enum.
///
/// Known verbs with missing or malformed arguments become
/// `Command::Invalid`; anything else is `Command::Unknown`.
pub fn parse_command(raw: &str) -> Command {
    let line = raw.trim_end_matches(['\r', '\n']);
    let (verb, rest) = split_arg(line);
    let verb = verb.to_ascii_uppercase();

    match verb.as_str() {
        "QUIT" | "Q" => Command::Quit,
        "STAT" | "STATS" => Command::Stat,
        "LIST" => Command::List(rest.to_string()),
        "READ" => {
            let (encoding, path) = split_arg(rest);
            if encoding.is_empty() || path.is_empty() {
                return Command::Invalid("usage: READ <encoding> <path>".into());
            }
            Command::Read {
                encoding: encoding.to_string(),
                path: path.to_string(),
            }
        }
        "WRITE" => {
            let (size, rest) = split_arg(rest);
            let (flag, path) = split_arg(rest);
            match (size.parse::<u64>(), parse_flag(flag)) {
                (Ok(size), Some(create_dirs)) if !path.is_empty() => Command::Write {
                    size,
                    create_dirs,
                    path: path.to_string(),
                },
                _ => Command::Invalid("usage: WRITE <size> <create_dirs 0|1> <path>".into()),
            }
        }
        "UPLOAD" => {
            let (size, filename) = split_arg(rest);
            match size.parse::<u64>() {
                Ok(size) if !filename.is_empty() => Command::Upload {
                    size,
                    filename: filename.to_string(),
                },
                _ => Command::Invalid("usage: UPLOAD <size> <filename>".into()),
            }
        }
        "DOWNLOAD" | "RETR" => path_command(rest, "DOWNLOAD", Command::Download),
        "META" | "METADATA" => path_command(rest, "META", Command::Meta),
        "DELE" | "DELETE" => path_command(rest, "DELE", Command::Dele),
        _ => Command::Unknown,
    }
}

fn path_command(rest: &str, verb: &str, build: fn(String) -> Command) -> Command {
    if rest.is_empty() {
        Command::Invalid(format!("usage: {} <path>", verb))
    } else {
        build(rest.to_string())
    }
}

/// Split off the first whitespace-delimited token. Leading whitespace of the
/// remainder is dropped; trailing whitespace belongs to it.
fn split_arg(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

fn parse_flag(flag: &str) -> Option<bool> {
    match flag.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
