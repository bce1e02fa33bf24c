//! Service classification for listening ports.
//!
//! Labels are derived from an ordered rule table. Earlier rules always win:
//! well-known port numbers beat process-name hints, and hints beat port-range
//! guesses.

use std::ops::RangeInclusive;

/// Service label constants used by the classifier and the allocator.
pub mod labels {
    pub const SSH: &str = "SSH";
    pub const HTTP: &str = "HTTP";
    pub const HTTPS: &str = "HTTPS";
    pub const MYSQL: &str = "MySQL";
    pub const POSTGRESQL: &str = "PostgreSQL";
    pub const REDIS: &str = "Redis";
    pub const PGBOUNCER: &str = "PgBouncer";
    pub const CUPS: &str = "CUPS";
    pub const DNS: &str = "DNS";
    pub const NODE_DEV: &str = "Node.js Dev";
    pub const HTTP_DEV: &str = "HTTP Dev";
    pub const HTTP_ALT: &str = "HTTP Alt";
    pub const FLASK_DEV: &str = "Flask Dev";
    pub const REACT_DEV: &str = "React Dev";
    pub const GRAPHQL: &str = "GraphQL";
    pub const DEBUG: &str = "Debug";
    pub const PROXY: &str = "Proxy/LB";
    pub const NODE: &str = "Node.js";
    pub const PYTHON: &str = "Python";
    pub const VS_CODE: &str = "VS Code";
    pub const SSH_ALT: &str = "SSH Alt";
    pub const DEV_SERVER: &str = "Dev Server";
    pub const DEV_API: &str = "Dev/API";
    pub const UNKNOWN: &str = "Unknown";
}

use labels::*;

/// A single classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Exact port number match.
    Port(u16),
    /// Case-insensitive substring match against the raw socket row.
    Tokens(&'static [&'static str]),
    /// Inclusive port range match.
    Range(u16, u16),
}

impl Rule {
    /// Check whether this rule matches a port and its lowercased row text.
    fn matches(&self, port: u16, row_lower: &str) -> bool {
        match *self {
            Rule::Port(p) => p == port,
            Rule::Tokens(tokens) => tokens.iter().any(|t| row_lower.contains(t)),
            Rule::Range(lo, hi) => RangeInclusive::new(lo, hi).contains(&port),
        }
    }
}

/// The ordered classification table. First match wins.
pub const RULES: &[(Rule, &str)] = &[
    // Well-known ports
    (Rule::Port(22), SSH),
    (Rule::Port(80), HTTP),
    (Rule::Port(443), HTTPS),
    (Rule::Port(3306), MYSQL),
    (Rule::Port(5432), POSTGRESQL),
    (Rule::Port(6379), REDIS),
    (Rule::Port(6432), PGBOUNCER),
    (Rule::Port(631), CUPS),
    (Rule::Port(53), DNS),
    (Rule::Port(3000), NODE_DEV),
    (Rule::Port(8000), HTTP_DEV),
    (Rule::Port(8080), HTTP_ALT),
    (Rule::Port(5000), FLASK_DEV),
    (Rule::Port(3001), REACT_DEV),
    (Rule::Port(4000), GRAPHQL),
    (Rule::Port(5678), DEBUG),
    (Rule::Port(7080), PROXY),
    // Process name hints
    (Rule::Tokens(&["sshd"]), SSH),
    (Rule::Tokens(&["nginx", "httpd", "apache"]), HTTP),
    (Rule::Tokens(&["mysql", "mariadb"]), MYSQL),
    (Rule::Tokens(&["postgres"]), POSTGRESQL),
    (Rule::Tokens(&["redis"]), REDIS),
    (Rule::Tokens(&["node"]), NODE),
    (Rule::Tokens(&["python"]), PYTHON),
    (Rule::Tokens(&["code"]), VS_CODE),
    // Port range guesses
    (Rule::Range(2000, 2299), SSH_ALT),
    (Rule::Range(3000, 3999), DEV_SERVER),
    (Rule::Range(8000, 8999), HTTP_ALT),
    (Rule::Range(5000, 5999), DEV_API),
];

/// Classify a listening port using its number and the raw socket row.
///
/// # Examples
/// ```
/// use wslports_core::classify;
///
/// assert_eq!(classify(22, "users:((\"nginx\",pid=1,fd=6))"), "SSH");
/// assert_eq!(classify(9229, "users:((\"node\",pid=7,fd=20))"), "Node.js");
/// assert_eq!(classify(3500, ""), "Dev Server");
/// assert_eq!(classify(9500, ""), "Unknown");
/// ```
pub fn classify(port: u16, row: &str) -> &'static str {
    let row_lower = row.to_lowercase();
    RULES
        .iter()
        .find(|(rule, _)| rule.matches(port, &row_lower))
        .map_or(UNKNOWN, |(_, label)| *label)
}
