//! Routing inputs, agent bindings, and resolved routes.

use serde::{Deserialize, Serialize};

/// Session-key granularity for direct peers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DMScope {
    /// All direct peers share the agent's main session.
    #[default]
    Main,
    /// One session per peer id.
    PerPeer,
    /// One session per (channel, peer id).
    PerChannelPeer,
    /// One session per (account, channel, peer id).
    PerAccountChannelPeer,
}

/// The message origin within a channel: a direct correspondent, a group, etc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePeer {
    pub kind: String,
    pub id: String,
}

impl RoutePeer {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    pub fn direct(id: impl Into<String>) -> Self {
        Self::new("direct", id)
    }

    pub fn is_direct(&self) -> bool {
        self.kind == "direct"
    }
}

/// Everything routing needs to know about an inbound message's origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInput {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub peer: Option<RoutePeer>,
    #[serde(default)]
    pub parent_peer: Option<RoutePeer>,
}

/// Matching predicate for one binding. `"*"` in `account_id` is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingMatch {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub peer: Option<RoutePeer>,
    #[serde(default)]
    pub guild_id: String,
    #[serde(default)]
    pub team_id: String,
}

impl BindingMatch {
    /// True when `account_id` carries no constraint.
    pub fn account_is_wildcard(&self) -> bool {
        self.account_id.is_empty() || self.account_id == "*"
    }
}

/// A configured rule mapping a message origin to an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBinding {
    pub agent_id: String,
    #[serde(rename = "match", default)]
    pub matcher: BindingMatch,
}

/// Which cascade level produced the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Peer,
    ParentPeer,
    Guild,
    Team,
    Account,
    ChannelWildcard,
    Default,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Peer => "peer",
            MatchReason::ParentPeer => "parent_peer",
            MatchReason::Guild => "guild",
            MatchReason::Team => "team",
            MatchReason::Account => "account",
            MatchReason::ChannelWildcard => "channel_wildcard",
            MatchReason::Default => "default",
        }
    }
}

/// Routing output: the chosen agent plus session identity and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRoute {
    pub agent_id: String,
    pub channel: String,
    pub account_id: String,
    pub session_key: String,
    pub main_session_key: String,
    pub matched_by: MatchReason,
}
