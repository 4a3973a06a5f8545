//! Built-in match-pattern annotations.
//!
//! Upstream ATT&CK data has no command-pattern field, so the signatures
//! that tie shell commands to techniques live here. Declaration order
//! matters twice: rules are evaluated against each line in this order, and
//! within a rule the first matching pattern is the one recorded.
//!
//! Anchored regexes catch command invocations (`^\s*cat\s`); literals catch
//! sensitive arguments anywhere on the line (`/etc/shadow`).

use super::{Annotation, PatternSpec};

fn lit(text: &str) -> PatternSpec {
    PatternSpec::Literal(text.to_string())
}

fn re(text: &str) -> PatternSpec {
    PatternSpec::Regex(text.to_string())
}

/// The default annotation table merged with the ATT&CK bundle at load time.
pub fn builtin_annotations() -> Vec<Annotation> {
    vec![
        // Credential access via world-readable credential files.
        Annotation::new(
            "T1003.008",
            vec![lit("/etc/shadow"), lit("/etc/passwd"), lit("getent shadow")],
        ),
        // Account enumeration.
        Annotation::new(
            "T1087",
            vec![re(r"\bpasswd\b"), re(r"\bsudoers\b"), re(r"^\s*id(\s|$)"), re(r"^\s*who(ami)?\s*$")],
        ),
        // Local data collection: reading files, system info dumps.
        Annotation::new(
            "T1005",
            vec![re(r"^\s*cat\s"), re(r"^\s*uname(\s|$)"), re(r"^\s*head\s"), re(r"^\s*tail\s")],
        ),
        // File and directory discovery.
        Annotation::new(
            "T1083",
            vec![
                re(r"^\s*cd(\s|$)"),
                re(r"^\s*ls(\s|$)"),
                re(r"^\s*(find|grep)\s"),
                re(r"^\s*(ps|top)(\s|$)"),
            ],
        ),
        // History and log tampering.
        Annotation::new(
            "T1070.003",
            vec![
                re(r">\s*\.?(bash|zsh)_history"),
                lit("history -c"),
                re(r"^\s*unset\s+histfile"),
                re(r"^\s*rm\s+.*history"),
            ],
        ),
        // Permission tampering on files.
        Annotation::new("T1222", vec![re(r"^\s*(chmod|chown)\s")]),
        // Use of valid accounts / privilege context switching.
        Annotation::new(
            "T1078",
            vec![re(r"^\s*sudo(\s|$)"), re(r"^\s*su(\s|$)")],
        ),
        // Shell interpreter abuse.
        Annotation::new(
            "T1059.004",
            vec![
                re(r"^\s*history(\s|$)"),
                lit("bash -i"),
                lit("sh -c"),
                re(r"\|\s*(ba)?sh\b"),
            ],
        ),
        // Tool transfer into the environment.
        Annotation::new(
            "T1105",
            vec![re(r"^\s*(wget|curl)\s"), re(r"^\s*scp\s"), re(r"^\s*ftp\s")],
        ),
        // Network connection discovery.
        Annotation::new(
            "T1049",
            vec![re(r"^\s*(netstat|ss)(\s|$)"), re(r"^\s*lsof\s+.*-i")],
        ),
        // Remote host discovery.
        Annotation::new(
            "T1018",
            vec![re(r"^\s*(traceroute|ping)\s"), re(r"^\s*arp(\s|$)"), re(r"^\s*nmap\s")],
        ),
        // Persistence through systemd services and cron.
        Annotation::new(
            "T1543.002",
            vec![re(r"^\s*systemctl\s+(enable|edit|daemon-reload)"), lit("/etc/systemd/system")],
        ),
        Annotation::new(
            "T1053.003",
            vec![re(r"^\s*crontab\s"), lit("/etc/cron")],
        ),
        // System shutdown or reboot.
        Annotation::new("T1529", vec![re(r"^\s*(poweroff|reboot|shutdown)(\s|$)")]),
    ]
}
