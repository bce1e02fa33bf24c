//! Parsing of `ss -tlnp` output into port records.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::OnceLock;

use regex::Regex;

use super::instance::PortRecord;
use super::service::classify;

/// Socket state that marks an accept-ready TCP endpoint.
const LISTEN_STATE: &str = "LISTEN";

fn process_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"users:\(\("([^"]+)""#).expect("process regex is valid"))
}

/// Split a local address column into address and port at the last colon.
///
/// Handles the formats `ss` prints:
/// - IPv4: "0.0.0.0:22" or "*:8080"
/// - IPv6: "\[::]:80" or "\[fe80::1%eth0]:8080"
/// - Zoned: "127.0.0.53%lo:53"
///
/// Returns `None` when there is no colon or the port is not a number in 1-65535.
pub fn split_local_address(local: &str) -> Option<(&str, u16)> {
    let last_colon = local.rfind(':')?;
    let addr = &local[..last_colon];
    let port: u16 = local[last_colon + 1..].parse().ok()?;
    if port == 0 {
        return None;
    }
    let addr = if addr.is_empty() { "*" } else { addr };
    Some((addr, port))
}

/// Check whether a bind address is only reachable from inside the instance.
///
/// Covers 127.0.0.0/8, ::1 and IPv4-mapped loopback, with or without
/// brackets and interface zone suffixes.
pub fn is_loopback(address: &str) -> bool {
    let bare = address.trim_start_matches('[').trim_end_matches(']');
    let bare = bare.split('%').next().unwrap_or(bare);

    match bare.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback(),
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}

/// Parse `ss -tlnp` output into classified, deduplicated port records.
///
/// Expected format:
/// ```text
/// State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
/// LISTEN 0      128          0.0.0.0:22         0.0.0.0:*     users:(("sshd",pid=201,fd=3))
/// LISTEN 0      511             [::]:80            [::]:*     users:(("nginx",pid=310,fd=7))
/// ```
///
/// Malformed rows are skipped silently. The first row seen for a port wins.
pub fn parse_listening_sockets(output: &str) -> Vec<PortRecord> {
    let mut ports = Vec::new();
    let mut seen: HashSet<u16> = HashSet::new();

    // Header line
    for line in output.lines().skip(1) {
        let components: Vec<&str> = line.split_whitespace().collect();
        if components.len() < 4 || components[0] != LISTEN_STATE {
            continue;
        }

        let Some((address, port)) = split_local_address(components[3]) else {
            continue;
        };

        if is_loopback(address) {
            continue;
        }

        if !seen.insert(port) {
            continue;
        }

        let process = process_regex()
            .captures(line)
            .map(|caps| caps[1].to_string());

        ports.push(PortRecord::tcp(port, address, classify(port, line), process));
    }

    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process";

    fn with_header(rows: &str) -> String {
        format!("{HEADER}\n{rows}")
    }

    #[test]
    fn test_split_ipv4_address() {
        assert_eq!(split_local_address("0.0.0.0:22"), Some(("0.0.0.0", 22)));
        assert_eq!(split_local_address("*:8080"), Some(("*", 8080)));
        assert_eq!(split_local_address(":8080"), Some(("*", 8080)));
    }

    #[test]
    fn test_split_ipv6_address() {
        assert_eq!(split_local_address("[::]:80"), Some(("[::]", 80)));
        assert_eq!(split_local_address("[::1]:631"), Some(("[::1]", 631)));
        assert_eq!(split_local_address("::1:631"), Some(("::1", 631)));
        assert_eq!(
            split_local_address("[fe80::1%eth0]:8080"),
            Some(("[fe80::1%eth0]", 8080))
        );
    }

    #[test]
    fn test_split_rejects_bad_ports() {
        assert_eq!(split_local_address("0.0.0.0"), None);
        assert_eq!(split_local_address("0.0.0.0:*"), None);
        assert_eq!(split_local_address("0.0.0.0:70000"), None);
        assert_eq!(split_local_address("0.0.0.0:0"), None);
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback("127.0.0.1"));
        assert!(is_loopback("127.0.0.53%lo"));
        assert!(is_loopback("127.1.2.3"));
        assert!(is_loopback("::1"));
        assert!(is_loopback("[::1]"));
        assert!(is_loopback("[::ffff:127.0.0.1]"));

        assert!(!is_loopback("0.0.0.0"));
        assert!(!is_loopback("[::]"));
        assert!(!is_loopback("*"));
        assert!(!is_loopback("172.28.160.1"));
        assert!(!is_loopback("[fe80::1%eth0]"));
    }

    #[test]
    fn test_parse_listening_sockets() {
        let output = with_header(
            r#"LISTEN 0 128 0.0.0.0:22 0.0.0.0:* users:(("sshd",pid=201,fd=3))
LISTEN 0 511 0.0.0.0:80 0.0.0.0:* users:(("nginx",pid=310,fd=6))
LISTEN 0 244 127.0.0.1:5432 0.0.0.0:* users:(("postgres",pid=402,fd=5))"#,
        );

        let ports = parse_listening_sockets(&output);
        assert_eq!(ports.len(), 2);

        assert_eq!(ports[0].port, 22);
        assert_eq!(ports[0].service_label, "SSH");
        assert_eq!(ports[0].bound_address, "0.0.0.0");
        assert_eq!(ports[0].process.as_deref(), Some("sshd"));

        assert_eq!(ports[1].port, 80);
        assert_eq!(ports[1].service_label, "HTTP");
    }

    #[test]
    fn test_deduplicates_by_port() {
        let output = with_header(
            r#"LISTEN 0 244 0.0.0.0:5432 0.0.0.0:* users:(("postgres",pid=402,fd=5))
LISTEN 0 244 [::]:5432 [::]:* users:(("postgres",pid=402,fd=6))"#,
        );

        let ports = parse_listening_sockets(&output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].bound_address, "0.0.0.0");
    }

    #[test]
    fn test_skips_loopback_rows() {
        let output = with_header(
            r#"LISTEN 0 4096 127.0.0.53%lo:53 0.0.0.0:*
LISTEN 0 128 127.0.0.1:3000 0.0.0.0:*
LISTEN 0 128 [::1]:631 [::]:*
LISTEN 0 128 0.0.0.0:3000 0.0.0.0:*"#,
        );

        let ports = parse_listening_sockets(&output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 3000);
        assert_eq!(ports[0].bound_address, "0.0.0.0");
        assert!(ports.iter().all(|p| !is_loopback(&p.bound_address)));
    }

    #[test]
    fn test_skips_noise() {
        let output = with_header(
            r#"
ESTAB 0 0 172.28.160.2:22 172.28.160.1:50000
LISTEN 0 128
LISTEN 0 128 garbage 0.0.0.0:*
LISTEN 0 128 0.0.0.0:http 0.0.0.0:*
UNCONN 0 0 0.0.0.0:68 0.0.0.0:*
LISTEN 0 128 *:8080 *:*"#,
        );

        let ports = parse_listening_sockets(&output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 8080);
        assert_eq!(ports[0].bound_address, "*");
        assert_eq!(ports[0].service_label, "HTTP Alt");
        assert!(ports[0].process.is_none());
    }

    #[test]
    fn test_header_only_or_empty() {
        assert!(parse_listening_sockets("").is_empty());
        assert!(parse_listening_sockets(HEADER).is_empty());
    }
}
