//! Built-in themes for flowdown.
//!
//! A theme names a [`Styles`] record. The renderer treats every style as
//! an opaque ANSI prefix, so custom themes can be built from any escape
//! sequences via [`Theme::new`].

pub mod palette;

use flowdown_types::{Style, Styles};
use palette::Palette;

/// A named set of renderer styles.
#[derive(Clone, Debug)]
pub struct Theme {
    name: String,
    styles: Styles,
}

impl Theme {
    /// Builds a theme from a caller-supplied style set.
    pub fn new(name: impl Into<String>, styles: Styles) -> Self {
        Theme {
            name: name.into(),
            styles,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }
}

/// Built-in theme names, sorted. `boring` renders without any escapes.
const BUILTIN: &[(&str, Palette)] = &[
    ("boring", palette::PLAIN),
    ("catppuccin-mocha", palette::CATPPUCCIN_MOCHA),
    ("default", palette::DEFAULT),
    ("dracula", palette::DRACULA),
    ("everforest", palette::EVERFOREST),
    ("github-dark", palette::GITHUB_DARK),
    ("github-light", palette::GITHUB_LIGHT),
    ("gruvbox", palette::GRUVBOX),
    ("gruvbox-light", palette::GRUVBOX_LIGHT),
    ("nord", palette::NORD),
    ("one-dark", palette::ONE_DARK),
    ("one-light", palette::ONE_LIGHT),
    ("rose-pine", palette::ROSE_PINE),
    ("solarized-dark", palette::SOLARIZED_DARK),
    ("solarized-light", palette::SOLARIZED_LIGHT),
    ("tokyo-night", palette::TOKYO_NIGHT),
];

fn style(prefixes: &[&str]) -> Style {
    let mut out = String::new();
    for p in prefixes {
        out.push_str(p);
    }
    Style::new(out)
}

fn styles_from_palette(p: &Palette) -> Styles {
    Styles {
        text: style(&[p.text]),
        heading: [
            style(&[palette::BOLD, p.h1]),
            style(&[palette::BOLD, p.h2]),
            style(&[palette::BOLD, p.h3]),
            style(&[palette::BOLD, p.h4]),
            style(&[palette::BOLD, p.h5]),
            style(&[palette::BOLD, p.h6]),
        ],
        emphasis: style(&[palette::ITALIC, p.emphasis]),
        strong: style(&[palette::BOLD, p.strong]),
        emphasis_strong: style(&[palette::BOLD, palette::ITALIC, p.emphasis_strong]),
        code_inline: style(&[p.code_inline]),
        code_block: style(&[p.code_block]),
        quote: style(&[p.quote]),
        list_marker: style(&[p.list_marker]),
        link_text: style(&[palette::UNDERLINE, p.link_text]),
        link_url: style(&[p.link_url]),
        thematic_break: style(&[p.thematic_break]),
    }
}

/// The default built-in theme.
pub fn default_theme() -> Theme {
    theme_by_name("default").unwrap_or_else(|| Theme::new("boring", Styles::default()))
}

/// Looks up a built-in theme. The empty string resolves to the default.
pub fn theme_by_name(name: &str) -> Option<Theme> {
    let normalized = name.trim().to_ascii_lowercase();
    let wanted = if normalized.is_empty() {
        "default"
    } else {
        normalized.as_str()
    };
    BUILTIN
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(name, palette)| Theme::new(*name, styles_from_palette(palette)))
}

/// Names of all built-in themes, sorted.
pub fn available_themes() -> Vec<&'static str> {
    BUILTIN.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_styled() {
        let theme = default_theme();
        assert_eq!(theme.name(), "default");
        assert!(!theme.styles().heading[0].is_empty());
        assert!(!theme.styles().link_text.is_empty());
    }

    #[test]
    fn lookup_is_case_insensitive_and_trimmed() {
        assert!(theme_by_name(" Dracula ").is_some());
        assert!(theme_by_name("GRUVBOX").is_some());
        assert!(theme_by_name("no-such-theme").is_none());
    }

    #[test]
    fn empty_name_resolves_to_default() {
        let theme = theme_by_name("").expect("default");
        assert_eq!(theme.name(), "default");
    }

    #[test]
    fn expected_themes_are_available() {
        let names = available_themes();
        for want in [
            "default",
            "boring",
            "dracula",
            "gruvbox",
            "gruvbox-light",
            "nord",
            "one-dark",
            "one-light",
            "solarized-dark",
            "solarized-light",
            "github-dark",
            "github-light",
            "tokyo-night",
            "catppuccin-mocha",
            "rose-pine",
            "everforest",
        ] {
            assert!(names.contains(&want), "missing theme {want}");
        }
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted, "theme list should be sorted");
    }

    #[test]
    fn boring_theme_has_no_escapes() {
        let theme = theme_by_name("boring").expect("boring");
        let styles = theme.styles();
        assert!(styles.text.is_empty());
        assert!(styles.heading.iter().all(|s| s.is_empty()));
        assert!(styles.code_inline.is_empty());
        assert!(styles.quote.is_empty());
    }

    #[test]
    fn emphasis_layers_attributes_over_color() {
        let theme = theme_by_name("dracula").expect("dracula");
        let styles = theme.styles();
        assert!(styles.emphasis.prefix.starts_with(palette::ITALIC));
        assert!(styles.strong.prefix.starts_with(palette::BOLD));
        assert!(styles.link_text.prefix.starts_with(palette::UNDERLINE));
    }
}
