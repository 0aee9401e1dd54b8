//! Kernel tunables applied by the configuration pipeline
//!
//! The table is defined in Rust and compiled into the binary; it is not
//! user-editable at runtime. Rendering produces `/etc/sysctl.conf` lines in
//! table order, and parsing reads them back, so a written file can be
//! checked against the table it came from.

/// Sysctl settings written to `/etc/sysctl.conf`, in file order
pub const TUNABLES: &[(&str, &str)] = &[
    // File handles
    ("fs.file-max", "100000"),
    // Networking throughput and connection handling
    ("net.ipv4.tcp_tw_reuse", "1"),
    ("net.ipv4.ip_forward", "0"),
    ("net.ipv4.tcp_fin_timeout", "30"),
    ("net.ipv4.tcp_keepalive_time", "600"),
    ("net.ipv4.tcp_max_syn_backlog", "4096"),
    ("net.ipv4.tcp_syncookies", "1"),
    ("net.ipv4.tcp_rmem", "4096 87380 6291456"),
    ("net.ipv4.tcp_wmem", "4096 65536 6291456"),
    ("net.ipv4.tcp_mtu_probing", "1"),
    ("net.core.somaxconn", "1024"),
    ("net.core.netdev_max_backlog", "5000"),
    ("net.ipv4.ip_local_port_range", "1024 65535"),
    // Routing hardening
    ("net.ipv4.conf.all.rp_filter", "1"),
    ("net.ipv4.conf.default.rp_filter", "1"),
    ("net.ipv4.conf.all.accept_redirects", "0"),
    ("net.ipv4.conf.default.accept_redirects", "0"),
    ("net.ipv4.conf.all.send_redirects", "0"),
    ("net.ipv4.conf.default.send_redirects", "0"),
    // Memory management
    ("vm.swappiness", "10"),
    ("vm.dirty_ratio", "15"),
    ("vm.dirty_background_ratio", "5"),
    // Kernel hardening
    ("kernel.sysrq", "0"),
    ("kernel.randomize_va_space", "2"),
    // IPv6 off by policy
    ("net.ipv6.conf.all.disable_ipv6", "1"),
    ("net.ipv6.conf.default.disable_ipv6", "1"),
    // Log suspicious packets
    ("net.ipv4.conf.all.log_martians", "1"),
    ("net.ipv4.conf.default.log_martians", "1"),
    // TCP feature flags
    ("net.ipv4.tcp_timestamps", "1"),
    ("net.ipv4.tcp_sack", "1"),
    ("net.ipv4.tcp_window_scaling", "1"),
    ("net.ipv4.tcp_no_metrics_save", "1"),
];

/// Render pairs as sysctl.conf lines (`key = value`), one per pair, in order
pub fn render(pairs: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        out.push_str(key);
        out.push_str(" = ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Parse sysctl.conf text back into pairs
///
/// Blank lines and `#` comments are skipped; values keep internal whitespace
/// (several tunables take space-separated triples).
pub fn parse(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        assert_eq!(TUNABLES.len(), 32);
        assert_eq!(TUNABLES[0], ("fs.file-max", "100000"));
        assert_eq!(
            TUNABLES[TUNABLES.len() - 1],
            ("net.ipv4.tcp_no_metrics_save", "1")
        );
    }

    #[test]
    fn test_render_line_format() {
        let text = render(&[("vm.swappiness", "10")]);
        assert_eq!(text, "vm.swappiness = 10\n");
    }

    #[test]
    fn test_round_trip_preserves_pairs_and_order() {
        let parsed = parse(&render(TUNABLES));

        assert_eq!(parsed.len(), TUNABLES.len());
        for (parsed_pair, table_pair) in parsed.iter().zip(TUNABLES) {
            assert_eq!(parsed_pair.0, table_pair.0);
            assert_eq!(parsed_pair.1, table_pair.1);
        }
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "# managed file\n\nvm.swappiness = 10\n  # indented comment\nkernel.sysrq=0\n";
        let parsed = parse(text);

        assert_eq!(
            parsed,
            vec![
                ("vm.swappiness".to_string(), "10".to_string()),
                ("kernel.sysrq".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_keeps_spaced_values() {
        let parsed = parse("net.ipv4.tcp_rmem = 4096 87380 6291456\n");
        assert_eq!(parsed[0].1, "4096 87380 6291456");
    }

    #[test]
    fn test_parse_ignores_lines_without_separator() {
        let parsed = parse("not a setting\nvm.swappiness = 10\n");
        assert_eq!(parsed.len(), 1);
    }
}
