//! OSC 8 hyperlink literals and environment capability detection.

/// Start of an OSC 8 hyperlink; followed by the URL and ST.
pub const OSC8_START: &str = "\x1b]8;;";
/// String terminator closing an OSC 8 parameter list.
pub const OSC8_ST: &str = "\x1b\\";
/// Complete end-of-hyperlink sequence.
pub const OSC8_END: &str = "\x1b]8;;\x1b\\";

/// Returns true if the environment likely supports OSC 8 hyperlinks.
///
/// `OSC8=0` is an explicit kill switch; otherwise known terminals are
/// matched by their identifying variables.
pub fn detect_osc8_support() -> bool {
    if std::env::var("OSC8").as_deref() == Ok("0") {
        return false;
    }
    if env_set("DOMTERM") || env_set("WT_SESSION") {
        return true;
    }
    if let Ok(program) = std::env::var("TERM_PROGRAM") {
        if matches!(program.as_str(), "iTerm.app" | "WezTerm" | "vscode") {
            return true;
        }
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.to_ascii_lowercase().contains("kitty") {
            return true;
        }
    }
    if let Ok(vte) = std::env::var("VTE_VERSION") {
        if let Ok(version) = vte.parse::<u32>() {
            return version >= 5000;
        }
    }
    false
}

fn env_set(key: &str) -> bool {
    std::env::var(key).map(|v| !v.is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc8_literals_are_well_formed() {
        assert!(OSC8_START.starts_with('\x1b'));
        assert!(OSC8_END.starts_with(OSC8_START));
        assert!(OSC8_END.ends_with(OSC8_ST));
    }
}
