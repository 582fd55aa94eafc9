//! Route resolution: the seven-level binding cascade.
//!
//! Levels are tried in priority order; within a level, bindings are scanned
//! in configured order and the first satisfying predicate wins. The Default
//! fallback is unconditional, so resolution is total.

use picoclaw_protocol::{
    AgentBinding, BindingMatch, DMScope, MatchReason, ResolvedRoute, RouteInput, RoutePeer,
};

/// Resolve an inbound message to an agent and session identity.
pub fn resolve_route(
    bindings: &[AgentBinding],
    default_agent_id: &str,
    scope: DMScope,
    input: &RouteInput,
) -> ResolvedRoute {
    let (agent_id, matched_by) = match_agent(bindings, default_agent_id, input);
    let session_key = session_key(&agent_id, scope, input);
    let main_session_key = main_session_key(&agent_id);

    ResolvedRoute {
        agent_id,
        channel: input.channel.clone(),
        account_id: input.account_id.clone(),
        session_key,
        main_session_key,
        matched_by,
    }
}

fn match_agent(
    bindings: &[AgentBinding],
    default_agent_id: &str,
    input: &RouteInput,
) -> (String, MatchReason) {
    let levels: [(MatchReason, fn(&BindingMatch, &RouteInput) -> bool); 6] = [
        (MatchReason::Peer, matches_peer),
        (MatchReason::ParentPeer, matches_parent_peer),
        (MatchReason::Guild, matches_guild),
        (MatchReason::Team, matches_team),
        (MatchReason::Account, matches_account),
        (MatchReason::ChannelWildcard, matches_channel_wildcard),
    ];

    for (reason, predicate) in levels {
        if let Some(binding) = bindings.iter().find(|b| predicate(&b.matcher, input)) {
            return (binding.agent_id.clone(), reason);
        }
    }

    (default_agent_id.to_owned(), MatchReason::Default)
}

fn peer_eq(wanted: &RoutePeer, actual: &RoutePeer) -> bool {
    wanted.kind == actual.kind && wanted.id == actual.id
}

fn matches_peer(matcher: &BindingMatch, input: &RouteInput) -> bool {
    match (&matcher.peer, &input.peer) {
        (Some(wanted), Some(actual)) => {
            peer_eq(wanted, actual) && matcher.channel == input.channel
        }
        _ => false,
    }
}

fn matches_parent_peer(matcher: &BindingMatch, input: &RouteInput) -> bool {
    match (&matcher.peer, &input.parent_peer) {
        (Some(wanted), Some(actual)) => {
            peer_eq(wanted, actual) && matcher.channel == input.channel
        }
        _ => false,
    }
}

fn matches_guild(matcher: &BindingMatch, input: &RouteInput) -> bool {
    !matcher.guild_id.is_empty()
        && matcher.guild_id == input.guild_id
        && matcher.channel == input.channel
}

fn matches_team(matcher: &BindingMatch, input: &RouteInput) -> bool {
    !matcher.team_id.is_empty()
        && matcher.team_id == input.team_id
        && matcher.channel == input.channel
}

fn matches_account(matcher: &BindingMatch, input: &RouteInput) -> bool {
    !matcher.account_is_wildcard()
        && matcher.account_id == input.account_id
        && matcher.channel == input.channel
        && matcher.peer.is_none()
}

fn matches_channel_wildcard(matcher: &BindingMatch, input: &RouteInput) -> bool {
    matcher.channel == input.channel
        && matcher.account_is_wildcard()
        && matcher.peer.is_none()
        && matcher.guild_id.is_empty()
        && matcher.team_id.is_empty()
}

/// Session key for the resolved agent, honoring the DM scope for direct
/// peers and a per-channel group key otherwise.
pub fn session_key(agent_id: &str, scope: DMScope, input: &RouteInput) -> String {
    match &input.peer {
        Some(peer) if peer.is_direct() => match scope {
            DMScope::Main => main_session_key(agent_id),
            DMScope::PerPeer => format!("agent:{agent_id}:direct:{}", peer.id),
            DMScope::PerChannelPeer => {
                format!("agent:{agent_id}:{}:direct:{}", input.channel, peer.id)
            }
            DMScope::PerAccountChannelPeer => format!(
                "agent:{agent_id}:{}:{}:direct:{}",
                input.account_id, input.channel, peer.id
            ),
        },
        Some(peer) => format!("agent:{agent_id}:{}:group:{}", input.channel, peer.id),
        None => main_session_key(agent_id),
    }
}

pub fn main_session_key(agent_id: &str) -> String {
    format!("agent:{agent_id}:main")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(agent_id: &str, matcher: BindingMatch) -> AgentBinding {
        AgentBinding {
            agent_id: agent_id.to_owned(),
            matcher,
        }
    }

    fn channel_match(channel: &str) -> BindingMatch {
        BindingMatch {
            channel: channel.to_owned(),
            ..BindingMatch::default()
        }
    }

    #[test]
    fn default_route_with_no_bindings() {
        let input = RouteInput {
            channel: "telegram".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&[], "main", DMScope::Main, &input);
        assert_eq!(route.agent_id, "main");
        assert_eq!(route.session_key, "agent:main:main");
        assert_eq!(route.main_session_key, "agent:main:main");
        assert_eq!(route.matched_by, MatchReason::Default);
    }

    #[test]
    fn peer_binding_beats_channel_binding() {
        let bindings = vec![
            binding("A", channel_match("telegram")),
            binding(
                "B",
                BindingMatch {
                    channel: "telegram".to_owned(),
                    peer: Some(RoutePeer::direct("123")),
                    ..BindingMatch::default()
                },
            ),
        ];
        let input = RouteInput {
            channel: "telegram".to_owned(),
            peer: Some(RoutePeer::direct("123")),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::PerPeer, &input);
        assert_eq!(route.agent_id, "B");
        assert_eq!(route.matched_by, MatchReason::Peer);
        assert_eq!(route.session_key, "agent:B:direct:123");
    }

    #[test]
    fn cascade_priority_order() {
        let bindings = vec![
            binding("agent-channel", channel_match("telegram")),
            binding(
                "agent-account",
                BindingMatch {
                    channel: "telegram".to_owned(),
                    account_id: "ACC1".to_owned(),
                    ..BindingMatch::default()
                },
            ),
            binding(
                "agent-peer",
                BindingMatch {
                    channel: "telegram".to_owned(),
                    peer: Some(RoutePeer::new("user", "PEER1")),
                    ..BindingMatch::default()
                },
            ),
        ];

        let full = RouteInput {
            channel: "telegram".to_owned(),
            account_id: "ACC1".to_owned(),
            peer: Some(RoutePeer::new("user", "PEER1")),
            ..RouteInput::default()
        };
        assert_eq!(
            resolve_route(&bindings, "main", DMScope::Main, &full).agent_id,
            "agent-peer"
        );

        let no_peer = RouteInput {
            channel: "telegram".to_owned(),
            account_id: "ACC1".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &no_peer);
        assert_eq!(route.agent_id, "agent-account");
        assert_eq!(route.matched_by, MatchReason::Account);

        let channel_only = RouteInput {
            channel: "telegram".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &channel_only);
        assert_eq!(route.agent_id, "agent-channel");
        assert_eq!(route.matched_by, MatchReason::ChannelWildcard);
    }

    #[test]
    fn parent_peer_matches_thread_origin() {
        let bindings = vec![binding(
            "threads",
            BindingMatch {
                channel: "slack".to_owned(),
                peer: Some(RoutePeer::new("channel", "C42")),
                ..BindingMatch::default()
            },
        )];
        let input = RouteInput {
            channel: "slack".to_owned(),
            peer: Some(RoutePeer::new("thread", "T1")),
            parent_peer: Some(RoutePeer::new("channel", "C42")),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &input);
        assert_eq!(route.agent_id, "threads");
        assert_eq!(route.matched_by, MatchReason::ParentPeer);
    }

    #[test]
    fn guild_and_team_levels() {
        let bindings = vec![
            binding(
                "guild-agent",
                BindingMatch {
                    channel: "discord".to_owned(),
                    guild_id: "G1".to_owned(),
                    ..BindingMatch::default()
                },
            ),
            binding(
                "team-agent",
                BindingMatch {
                    channel: "slack".to_owned(),
                    team_id: "T1".to_owned(),
                    ..BindingMatch::default()
                },
            ),
        ];

        let guild_input = RouteInput {
            channel: "discord".to_owned(),
            guild_id: "G1".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &guild_input);
        assert_eq!(route.agent_id, "guild-agent");
        assert_eq!(route.matched_by, MatchReason::Guild);

        let team_input = RouteInput {
            channel: "slack".to_owned(),
            team_id: "T1".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &team_input);
        assert_eq!(route.agent_id, "team-agent");
        assert_eq!(route.matched_by, MatchReason::Team);
    }

    #[test]
    fn account_binding_requires_exact_account() {
        let bindings = vec![binding(
            "work",
            BindingMatch {
                channel: "slack".to_owned(),
                account_id: "T12345".to_owned(),
                ..BindingMatch::default()
            },
        )];
        let matching = RouteInput {
            channel: "slack".to_owned(),
            account_id: "T12345".to_owned(),
            ..RouteInput::default()
        };
        assert_eq!(
            resolve_route(&bindings, "default", DMScope::Main, &matching).agent_id,
            "work"
        );

        let other = RouteInput {
            channel: "slack".to_owned(),
            account_id: "T99999".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "default", DMScope::Main, &other);
        assert_eq!(route.agent_id, "default");
        assert_eq!(route.matched_by, MatchReason::Default);
    }

    #[test]
    fn wildcard_account_binding_is_channel_level() {
        let bindings = vec![binding(
            "wild",
            BindingMatch {
                channel: "telegram".to_owned(),
                account_id: "*".to_owned(),
                ..BindingMatch::default()
            },
        )];
        let input = RouteInput {
            channel: "telegram".to_owned(),
            account_id: "anything".to_owned(),
            ..RouteInput::default()
        };
        let route = resolve_route(&bindings, "main", DMScope::Main, &input);
        assert_eq!(route.agent_id, "wild");
        assert_eq!(route.matched_by, MatchReason::ChannelWildcard);
    }

    #[test]
    fn session_keys_per_scope() {
        let input = RouteInput {
            channel: "telegram".to_owned(),
            account_id: "acc".to_owned(),
            peer: Some(RoutePeer::direct("42")),
            ..RouteInput::default()
        };
        assert_eq!(session_key("a", DMScope::Main, &input), "agent:a:main");
        assert_eq!(session_key("a", DMScope::PerPeer, &input), "agent:a:direct:42");
        assert_eq!(
            session_key("a", DMScope::PerChannelPeer, &input),
            "agent:a:telegram:direct:42"
        );
        assert_eq!(
            session_key("a", DMScope::PerAccountChannelPeer, &input),
            "agent:a:acc:telegram:direct:42"
        );
    }

    #[test]
    fn group_peer_gets_group_session_key() {
        let input = RouteInput {
            channel: "discord".to_owned(),
            peer: Some(RoutePeer::new("group", "g7")),
            ..RouteInput::default()
        };
        assert_eq!(
            session_key("a", DMScope::PerPeer, &input),
            "agent:a:discord:group:g7"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let bindings = vec![
            binding("A", channel_match("telegram")),
            binding("B", channel_match("telegram")),
        ];
        let input = RouteInput {
            channel: "telegram".to_owned(),
            ..RouteInput::default()
        };
        let first = resolve_route(&bindings, "main", DMScope::Main, &input);
        let second = resolve_route(&bindings, "main", DMScope::Main, &input);
        assert_eq!(first, second);
        // insertion order decides between equally specific bindings
        assert_eq!(first.agent_id, "A");
    }
}
