use std::fmt;

use anyhow::{bail, Result};

pub const DEFAULT_TLS_PORT: u16 = 6697;
pub const DEFAULT_VERSION: &str = "wutbot";
/// IRCv3 capabilities requested whenever the server offers them.
pub const REQUESTED_CAPABILITIES: [&str; 3] = ["server-time", "message-tags", "account-tag"];

#[derive(Clone, PartialEq, Eq)]
/// SASL PLAIN credentials.
pub struct SaslCredentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Host and port of the IRC server.
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Parses `host`, `host:port` or `[v6]:port`; the port defaults to 6697.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            bail!("server address cannot be empty");
        }

        let (host, port) = if let Some(bracketed) = raw.strip_prefix('[') {
            let Some((host, rest)) = bracketed.split_once(']') else {
                bail!("invalid server address '{raw}': unterminated '['");
            };
            let port = match rest.strip_prefix(':') {
                Some(port) => Some(port),
                None if rest.is_empty() => None,
                None => bail!("invalid server address '{raw}': unexpected '{rest}'"),
            };
            (host, port)
        } else {
            match raw.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                Some(_) => (raw, None),
                None => (raw, None),
            }
        };

        if host.is_empty() {
            bail!("invalid server address '{raw}': host cannot be empty");
        }
        let port = match port {
            Some(port) => match port.parse::<u16>() {
                Ok(0) | Err(_) => bail!("invalid server address '{raw}': bad port '{port}'"),
                Ok(port) => port,
            },
            None => DEFAULT_TLS_PORT,
        };
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Runtime configuration for one IRC session.
pub struct ConnectionConfig {
    pub server: ServerAddress,
    pub nick: String,
    pub username: String,
    pub realname: String,
    pub sasl: Option<SaslCredentials>,
    /// Sent as the QUIT farewell and in CTCP VERSION replies.
    pub version: String,
    pub insecure_skip_verify: bool,
}

impl ConnectionConfig {
    pub fn new(server: ServerAddress, nick: impl Into<String>) -> Self {
        let nick = nick.into();
        Self {
            server,
            username: nick.clone(),
            realname: nick.clone(),
            nick,
            sasl: None,
            version: DEFAULT_VERSION.to_string(),
            insecure_skip_verify: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionConfig, SaslCredentials, ServerAddress, DEFAULT_TLS_PORT};

    #[test]
    fn unit_server_address_parses_host_and_port_forms() {
        let address = ServerAddress::parse("irc.libera.chat:6697").expect("host:port");
        assert_eq!(address.host, "irc.libera.chat");
        assert_eq!(address.port, 6697);

        let address = ServerAddress::parse("irc.ergo.chat").expect("host");
        assert_eq!(address.port, DEFAULT_TLS_PORT);

        let address = ServerAddress::parse("[::1]:7000").expect("bracketed v6");
        assert_eq!(address.host, "::1");
        assert_eq!(address.port, 7000);
        assert_eq!(address.to_string(), "[::1]:7000");

        let address = ServerAddress::parse("::1").expect("bare v6");
        assert_eq!(address.host, "::1");
        assert_eq!(address.port, DEFAULT_TLS_PORT);
    }

    #[test]
    fn unit_server_address_rejects_invalid_forms() {
        for raw in ["", ":6697", "host:0", "host:notaport", "[::1", "[::1]x"] {
            assert!(ServerAddress::parse(raw).is_err(), "{raw} should fail");
        }
    }

    #[test]
    fn regression_sasl_debug_output_redacts_password() {
        let credentials = SaslCredentials {
            login: "wutbot".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("wutbot"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unit_connection_config_defaults_identity_fields_to_nick() {
        let config = ConnectionConfig::new(
            ServerAddress::parse("irc.example.net").expect("address"),
            "wutbot",
        );
        assert_eq!(config.username, "wutbot");
        assert_eq!(config.realname, "wutbot");
        assert_eq!(config.version, "wutbot");
        assert!(config.sasl.is_none());
    }
}
