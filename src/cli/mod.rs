use crate::domain::{
    QueryCriteria, SessionType, SortDirection, SortKey, format_epoch_seconds, parse_timestamp,
    sort_records,
};
use crate::infra::{
    FetchError, HttpSessionSource, ResolveEndpointError, SessionSource, resolve_endpoint,
};
use std::io::{self, Write};
use thiserror::Error;
use time::OffsetDateTime;

const DEFAULT_LIMIT: usize = 100;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Tui { endpoint: Option<String> },
    Command(CliCommand),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    Query {
        session_type: SessionType,
        user: String,
        app_name: String,
        since: OffsetDateTime,
        limit: usize,
        offset: usize,
        endpoint: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("missing required flag: {0}")]
    MissingRequiredFlag(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Endpoint(#[from] ResolveEndpointError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut global_endpoint: Option<String> = None;
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--endpoint" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--endpoint".to_string()))?;
                global_endpoint = Some(value.to_string());
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Tui {
            endpoint: global_endpoint,
        });
    };

    match subcommand.as_str() {
        "query" => {
            let mut session_type = SessionType::Enter;
            let mut user = String::new();
            let mut app_name = String::new();
            let mut since: Option<OffsetDateTime> = None;
            let mut limit = DEFAULT_LIMIT;
            let mut offset = 0usize;
            let mut endpoint = global_endpoint;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--type" | "-t" => {
                        let value = next_flag_value(&mut iter, "--type")?;
                        session_type = parse_session_type_flag("--type", value)?;
                    }
                    "--user" | "-u" => {
                        user = next_flag_value(&mut iter, "--user")?.to_string();
                    }
                    "--app" | "-a" => {
                        app_name = next_flag_value(&mut iter, "--app")?.to_string();
                    }
                    "--since" | "-s" => {
                        let value = next_flag_value(&mut iter, "--since")?;
                        since = Some(parse_timestamp(value).ok_or_else(|| {
                            CliParseError::InvalidFlagValue {
                                flag: "--since".to_string(),
                                value: value.to_string(),
                            }
                        })?);
                    }
                    "--limit" => {
                        let value = next_flag_value(&mut iter, "--limit")?;
                        limit = parse_usize_flag("--limit", value)?;
                    }
                    "--offset" => {
                        let value = next_flag_value(&mut iter, "--offset")?;
                        offset = parse_usize_flag("--offset", value)?;
                    }
                    "--endpoint" => {
                        endpoint = Some(next_flag_value(&mut iter, "--endpoint")?.to_string());
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            let since =
                since.ok_or_else(|| CliParseError::MissingRequiredFlag("--since".to_string()))?;

            Ok(CliInvocation::Command(CliCommand::Query {
                session_type,
                user,
                app_name,
                since,
                limit,
                offset,
                endpoint,
            }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

fn next_flag_value<'a, I>(iter: &mut I, flag: &str) -> Result<&'a str, CliParseError>
where
    I: Iterator<Item = &'a String>,
{
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))
}

fn parse_session_type_flag(flag: &str, value: &str) -> Result<SessionType, CliParseError> {
    match value {
        "enter" => Ok(SessionType::Enter),
        "attach" => Ok(SessionType::Attach),
        _ => Err(CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

pub fn run(command: CliCommand) -> Result<(), CliRunError> {
    match command {
        CliCommand::Query {
            session_type,
            user,
            app_name,
            since,
            limit,
            offset,
            endpoint,
        } => {
            let endpoint = resolve_endpoint(endpoint.as_deref())?;
            let source = HttpSessionSource::new(endpoint);
            let criteria = QueryCriteria {
                session_type,
                user,
                app_name,
                since,
            };

            let mut records = source.fetch(&criteria, offset, limit)?;
            sort_records(&mut records, SortKey::SessionId, SortDirection::Desc);

            let mut out = io::stdout().lock();
            for record in &records {
                let ended = if record.ended_at == 0 {
                    "-".to_string()
                } else {
                    format_epoch_seconds(record.ended_at)
                };
                let _ = writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    record.session_id,
                    record.session_type.label(),
                    record.user,
                    record.source_ip,
                    record.app_name,
                    record.proc_name,
                    record.instance_no,
                    record.node_ip,
                    record.status,
                    format_epoch_seconds(record.created_at),
                    ended,
                );
            }
            Ok(())
        }
    }
}
