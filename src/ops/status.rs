//! Feature-listing parser
//!
//! `dism /online /Get-Features /English` prints one block per feature:
//!
//! ```text
//! Feature Name : IIS-FTPServer
//! State : Enabled
//! ```
//!
//! The primary parse works on those field pairs. Text that contains a feature
//! token but not the structured shape falls back to the legacy heuristic:
//! the third whitespace-delimited token after the feature name equals
//! `Enabled`. An absent feature name always reads as disabled; nothing in
//! here returns an error.

use super::{Feature, FeatureStatus};
use log::debug;

/// Derive the enabled/disabled state of every known feature from one
/// enumeration output.
pub fn parse_feature_listing(text: &str) -> Vec<FeatureStatus> {
    Feature::ALL
        .iter()
        .map(|&feature| FeatureStatus {
            feature,
            enabled: feature_enabled(text, feature.dism_token()),
        })
        .collect()
}

fn feature_enabled(text: &str, token: &str) -> bool {
    if let Some(state) = structured_state(text, token) {
        return state.eq_ignore_ascii_case("enabled");
    }
    if text.contains(token) {
        debug!(
            "no structured state for {}, falling back to token heuristic",
            token
        );
        return heuristic_enabled(text, token);
    }
    false
}

/// Find the `State :` value of the block whose `Feature Name :` matches the
/// token exactly. Returns None when the block (or its state line) is absent.
fn structured_state(text: &str, token: &str) -> Option<String> {
    let mut lines = text.lines();
    loop {
        let line = lines.next()?;
        let (key, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };
        if key.trim() != "Feature Name" || value.trim() != token {
            continue;
        }
        loop {
            let follow = lines.next()?;
            if let Some((key, value)) = follow.split_once(':') {
                match key.trim() {
                    "State" => return Some(value.trim().to_string()),
                    // next block started without a state line
                    "Feature Name" => return None,
                    _ => {}
                }
            }
        }
    }
}

/// Legacy order-and-format-dependent heuristic, kept for outputs that do not
/// use the field layout.
fn heuristic_enabled(text: &str, token: &str) -> bool {
    match text.split_once(token) {
        Some((_, rest)) => rest
            .split_whitespace()
            .nth(2)
            .map_or(false, |word| word == "Enabled"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED_LISTING: &str = "\
Deployment Image Servicing and Management tool
Version: 10.0.19041.844

Image Version: 10.0.19045.3803

Features listing for package : Microsoft-Windows-Foundation-Package

Feature Name : IIS-WebServerRole
State : Enabled

Feature Name : IIS-FTPServer
State : Enabled

Feature Name : SMB1Protocol
State : Disabled

Feature Name : ServicesForNFS-Server
State : Disabled

The operation completed successfully.
";

    fn status_of(statuses: &[FeatureStatus], feature: Feature) -> bool {
        statuses
            .iter()
            .find(|s| s.feature == feature)
            .map(|s| s.enabled)
            .unwrap()
    }

    #[test]
    fn test_structured_listing() {
        let statuses = parse_feature_listing(STRUCTURED_LISTING);
        assert_eq!(statuses.len(), 3);
        assert!(status_of(&statuses, Feature::Ftp));
        assert!(!status_of(&statuses, Feature::Smb));
        assert!(!status_of(&statuses, Feature::Nfs));
    }

    #[test]
    fn test_heuristic_offset_shape() {
        // Third whitespace token after the feature name
        let text = "IIS-FTPServer x y Enabled trailing";
        assert!(feature_enabled(text, "IIS-FTPServer"));

        let text = "SMB1Protocol x y Disabled";
        assert!(!feature_enabled(text, "SMB1Protocol"));
    }

    #[test]
    fn test_absent_feature_reads_disabled() {
        let text = "Feature Name : SomethingElse\nState : Enabled\n";
        assert!(!feature_enabled(text, "IIS-FTPServer"));

        let statuses = parse_feature_listing("");
        assert!(statuses.iter().all(|s| !s.enabled));
    }

    #[test]
    fn test_garbage_degrades_without_error() {
        let statuses = parse_feature_listing("%%% not a listing at all ###");
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| !s.enabled));
    }

    #[test]
    fn test_state_line_belongs_to_matching_block() {
        // The FTP block has no state line; the following block's state must
        // not leak into it.
        let text = "\
Feature Name : IIS-FTPServer
Feature Name : SMB1Protocol
State : Enabled
";
        assert!(!feature_enabled(text, "IIS-FTPServer"));
        assert!(feature_enabled(text, "SMB1Protocol"));
    }

    #[test]
    fn test_table_of_state_values() {
        let cases = [
            ("Enabled", true),
            ("enabled", true),
            ("Disabled", false),
            ("Enable Pending", false),
            ("Disable Pending", false),
            ("", false),
        ];
        for (state, expected) in cases {
            let text = format!("Feature Name : SMB1Protocol\nState : {}\n", state);
            assert_eq!(
                feature_enabled(&text, "SMB1Protocol"),
                expected,
                "state {:?}",
                state
            );
        }
    }
}
