use clap::{builder::FalseyValueParser, ArgAction, Parser};
use wutbot_connection::DEFAULT_VERSION;
use wutbot_runtime::DEFAULT_CONCURRENCY_LIMIT;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.81 Safari/537.36";

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "wutbot",
    about = "IRC bot that joins a fixed set of channels and answers to a single owner",
    version
)]
/// Command-line and `WUTBOT_*` environment configuration.
pub struct Cli {
    #[arg(long, env = "WUTBOT_NICK", help = "Nickname to register with")]
    pub nick: String,

    #[arg(
        long,
        env = "WUTBOT_SERVER",
        help = "IRC server as host[:port]. TLS is always used; the port defaults to 6697"
    )]
    pub server: String,

    #[arg(
        long,
        env = "WUTBOT_CHANNELS",
        help = "Comma-delimited channels to join after connecting"
    )]
    pub channels: String,

    #[arg(
        long = "sasl-login",
        env = "WUTBOT_SASL_LOGIN",
        help = "SASL PLAIN account name. Requires --sasl-password"
    )]
    pub sasl_login: Option<String>,

    #[arg(
        long = "sasl-password",
        env = "WUTBOT_SASL_PASSWORD",
        hide_env_values = true,
        help = "SASL PLAIN password. Requires --sasl-login"
    )]
    pub sasl_password: Option<String>,

    #[arg(
        long = "owner-account",
        env = "WUTBOT_OWNER_ACCOUNT",
        default_value = "",
        help = "Services account allowed to issue owner commands. Empty disables owner commands"
    )]
    pub owner_account: String,

    #[arg(
        long = "version-string",
        env = "WUTBOT_VERSION",
        default_value = DEFAULT_VERSION,
        help = "Quit message and CTCP VERSION reply"
    )]
    pub version_string: String,

    #[arg(
        long,
        env = "WUTBOT_DEBUG",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = FalseyValueParser::new(),
        help = "Log raw protocol traffic and dispatch decisions at debug level"
    )]
    pub debug: bool,

    #[arg(
        long = "insecure-skip-verify",
        env = "WUTBOT_INSECURE_SKIP_VERIFY",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = FalseyValueParser::new(),
        help = "Accept any TLS certificate from the server"
    )]
    pub insecure_skip_verify: bool,

    #[arg(
        long = "user-agent",
        env = "WUTBOT_USER_AGENT",
        default_value = DEFAULT_USER_AGENT,
        help = "User-Agent reported for outbound HTTP requests"
    )]
    pub user_agent: String,

    #[arg(
        long = "concurrency-limit",
        env = "WUTBOT_CONCURRENCY_LIMIT",
        default_value_t = DEFAULT_CONCURRENCY_LIMIT,
        value_parser = parse_positive_usize,
        help = "Maximum number of event dispatches in flight at once"
    )]
    pub concurrency_limit: usize,
}
