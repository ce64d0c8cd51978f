//! Robots.txt caching implementation
//!
//! Rules are cached per origin and refetched after 24 hours.

use crate::robots::RobotsRules;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Rules for one origin and the time they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: RobotsRules,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: RobotsRules) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached rules are older than 24 hours
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.fetched_at;
        age > Duration::hours(24)
    }
}

/// Per-origin robots.txt cache
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets fresh rules for an origin, if cached
    pub fn get(&self, origin: &str) -> Option<&RobotsRules> {
        self.entries
            .get(origin)
            .filter(|cached| !cached.is_stale())
            .map(|cached| &cached.rules)
    }

    pub fn insert(&mut self, origin: String, rules: RobotsRules) {
        self.entries.insert(origin, CachedRobots::new(rules));
    }
}
