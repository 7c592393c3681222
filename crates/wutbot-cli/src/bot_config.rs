use anyhow::{bail, Context, Result};
use wutbot_access::OwnerAccount;
use wutbot_connection::{ConnectionConfig, SaslCredentials, ServerAddress, DEFAULT_VERSION};
use wutbot_runtime::{parse_channel_list, BotIdentity, ConcurrencyGate, EventRouter};

use crate::cli_args::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Validated startup configuration.
pub struct BotConfig {
    pub connection: ConnectionConfig,
    pub channels: Vec<String>,
    pub owner: OwnerAccount,
    pub concurrency_limit: usize,
    pub user_agent: String,
}

impl BotConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let nick = cli.nick.trim();
        if nick.is_empty() {
            bail!("nick cannot be empty");
        }
        if nick.contains(char::is_whitespace) {
            bail!("nick '{nick}' cannot contain whitespace");
        }
        let server = ServerAddress::parse(&cli.server).context("invalid --server")?;
        if cli.concurrency_limit == 0 {
            bail!("concurrency limit must be greater than 0");
        }

        let mut connection = ConnectionConfig::new(server, nick);
        connection.sasl = sasl_credentials(cli)?;
        connection.insecure_skip_verify = cli.insecure_skip_verify;
        connection.version = if cli.version_string.trim().is_empty() {
            DEFAULT_VERSION.to_string()
        } else {
            cli.version_string.clone()
        };

        Ok(Self {
            connection,
            channels: parse_channel_list(&cli.channels),
            owner: OwnerAccount::new(cli.owner_account.clone()),
            concurrency_limit: cli.concurrency_limit,
            user_agent: cli.user_agent.clone(),
        })
    }

    pub fn build_router(&self) -> Result<EventRouter> {
        let gate = ConcurrencyGate::new(self.concurrency_limit)?;
        let identity = BotIdentity::new(self.connection.nick.clone(), self.owner.clone());
        Ok(EventRouter::new(identity, self.channels.clone(), gate))
    }
}

fn sasl_credentials(cli: &Cli) -> Result<Option<SaslCredentials>> {
    let login = cli.sasl_login.as_deref().filter(|value| !value.is_empty());
    let password = cli.sasl_password.as_deref().filter(|value| !value.is_empty());
    match (login, password) {
        (Some(login), Some(password)) => Ok(Some(SaslCredentials {
            login: login.to_string(),
            password: password.to_string(),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => bail!("--sasl-login requires --sasl-password"),
        (None, Some(_)) => bail!("--sasl-password requires --sasl-login"),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::BotConfig;
    use crate::cli_args::Cli;

    fn parse_cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "wutbot",
            "--nick=wutbot",
            "--server=irc.ergo.chat",
            "--channels=#chat, ,#dev,",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).expect("parse cli")
    }

    #[test]
    fn functional_bot_config_applies_defaults_and_skips_empty_channels() {
        let config = BotConfig::from_cli(&parse_cli(&[])).expect("config");
        assert_eq!(config.connection.nick, "wutbot");
        assert_eq!(config.connection.server.to_string(), "irc.ergo.chat:6697");
        assert_eq!(config.channels, vec!["#chat".to_string(), "#dev".to_string()]);
        assert!(config.connection.sasl.is_none());
        assert!(!config.owner.is_configured());
        assert_eq!(config.connection.version, "wutbot");
    }

    #[test]
    fn functional_bot_config_builds_router_with_identity_and_gate() {
        let config = BotConfig::from_cli(&parse_cli(&[
            "--owner-account=hunter",
            "--concurrency-limit=4",
        ]))
        .expect("config");
        let router = config.build_router().expect("router");
        assert_eq!(router.identity().nick(), "wutbot");
        assert!(router.identity().is_owner(Some("hunter")));
        assert_eq!(router.gate().capacity(), 4);
        assert_eq!(router.channels().len(), 2);
    }

    #[test]
    fn functional_bot_config_enables_sasl_when_both_credentials_are_set() {
        let config = BotConfig::from_cli(&parse_cli(&[
            "--sasl-login=wutbot",
            "--sasl-password=hunter2",
        ]))
        .expect("config");
        let sasl = config.connection.sasl.expect("sasl credentials");
        assert_eq!(sasl.login, "wutbot");
        assert_eq!(sasl.password, "hunter2");
    }

    #[test]
    fn regression_bot_config_rejects_half_configured_sasl() {
        let error = BotConfig::from_cli(&parse_cli(&["--sasl-login=wutbot"]))
            .expect_err("login without password must fail");
        assert!(error.to_string().contains("--sasl-password"));
    }

    #[test]
    fn regression_bot_config_rejects_blank_nick_and_bad_port() {
        let mut cli = parse_cli(&[]);
        cli.nick = "   ".to_string();
        assert!(BotConfig::from_cli(&cli).is_err());

        let mut cli = parse_cli(&[]);
        cli.server = "irc.ergo.chat:notaport".to_string();
        assert!(BotConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn regression_bot_config_restores_default_version_when_blank() {
        let config = BotConfig::from_cli(&parse_cli(&["--version-string="])).expect("config");
        assert_eq!(config.connection.version, "wutbot");
    }
}
