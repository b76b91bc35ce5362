use super::{non_empty_env, parse_bool_env};
use thiserror::Error;

/// Token bucket for one route group: refill rate and bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    Auth,
    PublicRead,
    Protected,
    Chat,
}

impl RouteGroup {
    const ALL: [RouteGroup; 4] = [
        RouteGroup::Auth,
        RouteGroup::PublicRead,
        RouteGroup::Protected,
        RouteGroup::Chat,
    ];

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auth" => Some(RouteGroup::Auth),
            "public" | "public_read" | "public-read" => Some(RouteGroup::PublicRead),
            "protected" => Some(RouteGroup::Protected),
            "chat" => Some(RouteGroup::Chat),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RateLimitParseError {
    #[error("empty value")]
    Empty,
    #[error("invalid rule '{0}', expected per_second:burst")]
    Rule(String),
    #[error("unknown group '{0}', expected auth/public/protected/chat")]
    Group(String),
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Token exchange; each call reaches GitHub.
    pub auth: RateLimitRule,
    pub public_read: RateLimitRule,
    pub protected: RateLimitRule,
    /// Model calls are the expensive path.
    pub chat: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public_read: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
            chat: RateLimitRule::new(1, 5),
        }
    }
}

impl RateLimitConfig {
    /// `RATE_LIMIT_ENABLED` toggles limiting; `RATE_LIMIT_CONFIG` is either one
    /// rule for every group (`10:20`) or per group
    /// (`auth=5:10,public=30:60,protected=10:20,chat=1:5`).
    pub fn from_env() -> Self {
        let mut cfg = Self {
            enabled: parse_bool_env("RATE_LIMIT_ENABLED", true),
            ..Self::default()
        };

        if let Some(raw) = non_empty_env("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }

        cfg
    }

    fn rule_mut(&mut self, group: RouteGroup) -> &mut RateLimitRule {
        match group {
            RouteGroup::Auth => &mut self.auth,
            RouteGroup::PublicRead => &mut self.public_read,
            RouteGroup::Protected => &mut self.protected,
            RouteGroup::Chat => &mut self.chat,
        }
    }

    /// Overrides are applied only when the whole value parses.
    fn apply(&mut self, raw: &str) -> Result<(), RateLimitParseError> {
        for (group, rule) in parse_overrides(raw)? {
            *self.rule_mut(group) = rule;
        }
        Ok(())
    }
}

fn parse_overrides(raw: &str) -> Result<Vec<(RouteGroup, RateLimitRule)>, RateLimitParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RateLimitParseError::Empty);
    }

    if !raw.contains('=') {
        let rule = parse_rule(raw)?;
        return Ok(RouteGroup::ALL.iter().map(|g| (*g, rule)).collect());
    }

    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (name, rule) = item
                .split_once('=')
                .ok_or_else(|| RateLimitParseError::Rule(item.to_string()))?;
            let group = RouteGroup::parse(name.trim())
                .ok_or_else(|| RateLimitParseError::Group(name.trim().to_string()))?;
            Ok((group, parse_rule(rule.trim())?))
        })
        .collect()
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, RateLimitParseError> {
    let invalid = || RateLimitParseError::Rule(raw.to_string());

    let (per_second, burst_size) = raw.split_once(':').ok_or_else(invalid)?;
    let per_second: u64 = per_second.trim().parse().map_err(|_| invalid())?;
    let burst_size: u32 = burst_size.trim().parse().map_err(|_| invalid())?;

    if per_second == 0 {
        return Err(RateLimitParseError::Zero("per_second"));
    }
    if burst_size == 0 {
        return Err(RateLimitParseError::Zero("burst_size"));
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
