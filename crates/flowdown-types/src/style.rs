//! ANSI style records consumed by the renderer.
//!
//! A style is nothing more than a raw escape prefix; the renderer never
//! parses it, it only writes it after a reset when the active style
//! changes.

/// The ANSI reset sequence restoring the default style register.
pub const ANSI_RESET: &str = "\x1b[0m";

/// A terminal style expressed as an opaque ANSI prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    pub prefix: String,
}

impl Style {
    pub fn new(prefix: impl Into<String>) -> Self {
        Style {
            prefix: prefix.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// The semantic style set a theme provides to the renderer.
#[derive(Clone, Debug, Default)]
pub struct Styles {
    pub text: Style,
    pub heading: [Style; 6],
    pub emphasis: Style,
    pub strong: Style,
    pub emphasis_strong: Style,
    pub code_inline: Style,
    pub code_block: Style,
    pub quote: Style,
    pub list_marker: Style,
    pub link_text: Style,
    pub link_url: Style,
    pub thematic_break: Style,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_styles_are_unstyled() {
        let styles = Styles::default();
        assert!(styles.text.is_empty());
        assert!(styles.heading.iter().all(Style::is_empty));
        assert!(styles.quote.is_empty());
    }

    #[test]
    fn style_prefix_round_trips() {
        let style = Style::new("\x1b[1m");
        assert!(!style.is_empty());
        assert_eq!(style.prefix, "\x1b[1m");
    }
}
