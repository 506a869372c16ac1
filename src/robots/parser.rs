//! Robots.txt matching
//!
//! Allow/disallow decisions are delegated to the robotstxt crate; the
//! `Crawl-delay` extension is read here because that crate ignores it.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Robots.txt rules for the crawl origin
#[derive(Debug, Clone, Default)]
pub struct ParsedRobots {
    /// Raw robots.txt content; empty means everything is allowed
    content: String,
}

/// One `User-agent` group and the crawl delay it declares
#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    crawl_delay: Option<f64>,
}

impl ParsedRobots {
    /// Wraps raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything
    ///
    /// Used when robots.txt is missing, unreadable, or not consulted.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks whether `url` (absolute) may be fetched by `user_agent`
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Crawl delay declared for `user_agent`
    ///
    /// A group naming the agent (case-insensitive substring match) wins over
    /// the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let agent = user_agent.to_lowercase();
        let groups = self.groups();

        let specific = groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a != "*" && agent.contains(a.as_str())))
            .find_map(|g| g.crawl_delay);

        let wildcard = groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| a == "*"))
            .find_map(|g| g.crawl_delay);

        specific
            .or(wildcard)
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }

    fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = Vec::new();
        let mut open = false;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if !open {
                        groups.push(Group::default());
                        open = true;
                    }
                    if let Some(group) = groups.last_mut() {
                        group.agents.push(value.to_lowercase());
                    }
                }
                "crawl-delay" => {
                    open = false;
                    if let (Some(group), Ok(delay)) = (groups.last_mut(), value.parse::<f64>()) {
                        group.crawl_delay = Some(delay);
                    }
                }
                _ => open = false,
            }
        }

        groups
    }
}
