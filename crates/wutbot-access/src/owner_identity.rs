#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Configured owner account. An empty value disables every owner privilege.
pub struct OwnerAccount {
    account: String,
}

impl OwnerAccount {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    /// Owner that never matches any sender.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        self.account.as_str()
    }

    pub fn is_configured(&self) -> bool {
        !self.account.is_empty()
    }

    /// Returns true when the server-asserted account tag names this owner.
    pub fn matches(&self, account_tag: Option<&str>) -> bool {
        is_owner(account_tag, self.as_str())
    }
}

/// Decides whether a sender is the authenticated owner.
///
/// Only the `account` tag is consulted: it is asserted by the server, while nicks and
/// display names are chosen by the sender. Comparison is exact and case-sensitive, and an
/// empty `configured_owner` authorizes nothing.
pub fn is_owner(account_tag: Option<&str>, configured_owner: &str) -> bool {
    if configured_owner.is_empty() {
        return false;
    }
    matches!(account_tag, Some(account) if account == configured_owner)
}
