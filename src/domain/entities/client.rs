use std::fmt;

/// A client connected to the chat server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Client {
    pub id: String,
    pub nickname: Option<String>,
    pub server_groups: Vec<String>,
    pub channel_id: Option<String>,
}

impl Client {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: None,
            server_groups: Vec::new(),
            channel_id: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.server_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// True if the client is a member of at least one of `groups`
    pub fn in_any_group(&self, groups: &[String]) -> bool {
        groups.iter().any(|g| self.server_groups.contains(g))
    }

    pub fn display_name(&self) -> String {
        self.nickname.clone().unwrap_or_else(|| self.id.clone())
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (clid={})", self.display_name(), self.id)
    }
}
