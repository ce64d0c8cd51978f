//! Line-oriented robots.txt scanning
//!
//! Only `User-agent` and `Disallow` lines are understood. Every
//! `User-agent` line opens a new block; `Disallow` lines belong to the most
//! recent block. Allow rules, wildcards and crawl delays are not supported.

/// Disallow rules for one `User-agent` line
#[derive(Debug, Clone, PartialEq, Eq)]
struct AgentBlock {
    /// Agent token as written, lowercased
    agent: String,
    disallow: Vec<String>,
}

impl AgentBlock {
    /// `*` applies to everyone; otherwise the token and the configured user
    /// agent must contain one another, ignoring case
    fn applies_to(&self, user_agent: &str) -> bool {
        if self.agent == "*" {
            return true;
        }
        if self.agent.is_empty() {
            return false;
        }
        let user_agent = user_agent.to_lowercase();
        user_agent.contains(&self.agent) || self.agent.contains(&user_agent)
    }
}

/// Scanned robots.txt rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    blocks: Vec<AgentBlock>,
}

impl RobotsRules {
    /// Scans robots.txt content
    pub fn parse(content: &str) -> Self {
        let mut blocks: Vec<AgentBlock> = Vec::new();

        for line in content.lines() {
            let line = line.trim();

            if let Some(agent) = strip_directive(line, "user-agent:") {
                blocks.push(AgentBlock {
                    agent: agent.to_lowercase(),
                    disallow: Vec::new(),
                });
            } else if let Some(path) = strip_directive(line, "disallow:") {
                // An empty Disallow allows everything
                if path.is_empty() {
                    continue;
                }
                if let Some(block) = blocks.last_mut() {
                    block.disallow.push(path.to_string());
                }
            }
        }

        Self { blocks }
    }

    /// Rules that allow every path
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a path may be fetched by `user_agent`
    ///
    /// A path is denied when an applying block disallows `/` or a prefix of
    /// the path.
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        !self
            .blocks
            .iter()
            .filter(|block| block.applies_to(user_agent))
            .flat_map(|block| block.disallow.iter())
            .any(|rule| rule == "/" || path.starts_with(rule.as_str()))
    }

    /// Number of `User-agent` blocks scanned
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Case-insensitive prefix match returning the trimmed value
fn strip_directive<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    let head = line.get(..directive.len())?;
    if head.eq_ignore_ascii_case(directive) {
        Some(line[directive.len()..].trim())
    } else {
        None
    }
}
