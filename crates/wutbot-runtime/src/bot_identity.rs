use wutbot_access::OwnerAccount;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Nick and owner the router was built with. Fixed for the life of a connection.
pub struct BotIdentity {
    nick: String,
    owner: OwnerAccount,
}

impl BotIdentity {
    pub fn new(nick: impl Into<String>, owner: OwnerAccount) -> Self {
        Self {
            nick: nick.into(),
            owner,
        }
    }

    /// Configured nick; owner commands and mentions must start with it.
    pub fn nick(&self) -> &str {
        self.nick.as_str()
    }

    pub fn owner(&self) -> &OwnerAccount {
        &self.owner
    }

    pub fn is_owner(&self, account_tag: Option<&str>) -> bool {
        self.owner.matches(account_tag)
    }
}
