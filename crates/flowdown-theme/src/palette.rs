//! Raw color palettes behind the built-in themes.
//!
//! Each field is an SGR prefix (or empty for the terminal default). The
//! attribute constants are layered on top when a [`crate::Theme`] is
//! assembled: emphasis gains italic, strong gains bold, link text gains
//! underline.

pub const BOLD: &str = "\x1b[1m";
pub const ITALIC: &str = "\x1b[3m";
pub const UNDERLINE: &str = "\x1b[4m";

/// Color assignments for one theme, as raw SGR prefixes.
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub text: &'static str,
    pub h1: &'static str,
    pub h2: &'static str,
    pub h3: &'static str,
    pub h4: &'static str,
    pub h5: &'static str,
    pub h6: &'static str,
    pub emphasis: &'static str,
    pub strong: &'static str,
    pub emphasis_strong: &'static str,
    pub code_inline: &'static str,
    pub code_block: &'static str,
    pub quote: &'static str,
    pub list_marker: &'static str,
    pub link_text: &'static str,
    pub link_url: &'static str,
    pub thematic_break: &'static str,
}

/// A palette with every slot empty, used by the `boring` theme.
pub const PLAIN: Palette = Palette {
    text: "",
    h1: "",
    h2: "",
    h3: "",
    h4: "",
    h5: "",
    h6: "",
    emphasis: "",
    strong: "",
    emphasis_strong: "",
    code_inline: "",
    code_block: "",
    quote: "",
    list_marker: "",
    link_text: "",
    link_url: "",
    thematic_break: "",
};

pub const DEFAULT: Palette = Palette {
    text: "",
    h1: "\x1b[38;5;212m",
    h2: "\x1b[38;5;141m",
    h3: "\x1b[38;5;75m",
    h4: "\x1b[38;5;79m",
    h5: "\x1b[38;5;149m",
    h6: "\x1b[38;5;179m",
    emphasis: "",
    strong: "",
    emphasis_strong: "",
    code_inline: "\x1b[38;5;203m",
    code_block: "\x1b[38;5;252m",
    quote: "\x1b[38;5;244m",
    list_marker: "\x1b[38;5;214m",
    link_text: "\x1b[38;5;39m",
    link_url: "\x1b[38;5;244m",
    thematic_break: "\x1b[38;5;240m",
};

pub const DRACULA: Palette = Palette {
    text: "\x1b[38;5;253m",
    h1: "\x1b[38;5;212m",
    h2: "\x1b[38;5;141m",
    h3: "\x1b[38;5;117m",
    h4: "\x1b[38;5;84m",
    h5: "\x1b[38;5;228m",
    h6: "\x1b[38;5;215m",
    emphasis: "\x1b[38;5;228m",
    strong: "\x1b[38;5;212m",
    emphasis_strong: "\x1b[38;5;212m",
    code_inline: "\x1b[38;5;84m",
    code_block: "\x1b[38;5;253m",
    quote: "\x1b[38;5;61m",
    list_marker: "\x1b[38;5;141m",
    link_text: "\x1b[38;5;117m",
    link_url: "\x1b[38;5;61m",
    thematic_break: "\x1b[38;5;61m",
};

pub const GRUVBOX: Palette = Palette {
    text: "\x1b[38;5;223m",
    h1: "\x1b[38;5;208m",
    h2: "\x1b[38;5;214m",
    h3: "\x1b[38;5;142m",
    h4: "\x1b[38;5;108m",
    h5: "\x1b[38;5;109m",
    h6: "\x1b[38;5;175m",
    emphasis: "\x1b[38;5;142m",
    strong: "\x1b[38;5;208m",
    emphasis_strong: "\x1b[38;5;208m",
    code_inline: "\x1b[38;5;108m",
    code_block: "\x1b[38;5;187m",
    quote: "\x1b[38;5;245m",
    list_marker: "\x1b[38;5;214m",
    link_text: "\x1b[38;5;109m",
    link_url: "\x1b[38;5;245m",
    thematic_break: "\x1b[38;5;243m",
};

pub const GRUVBOX_LIGHT: Palette = Palette {
    text: "\x1b[38;5;237m",
    h1: "\x1b[38;5;124m",
    h2: "\x1b[38;5;130m",
    h3: "\x1b[38;5;100m",
    h4: "\x1b[38;5;65m",
    h5: "\x1b[38;5;24m",
    h6: "\x1b[38;5;96m",
    emphasis: "\x1b[38;5;100m",
    strong: "\x1b[38;5;124m",
    emphasis_strong: "\x1b[38;5;124m",
    code_inline: "\x1b[38;5;65m",
    code_block: "\x1b[38;5;237m",
    quote: "\x1b[38;5;244m",
    list_marker: "\x1b[38;5;130m",
    link_text: "\x1b[38;5;24m",
    link_url: "\x1b[38;5;244m",
    thematic_break: "\x1b[38;5;246m",
};

pub const NORD: Palette = Palette {
    text: "\x1b[38;5;253m",
    h1: "\x1b[38;5;110m",
    h2: "\x1b[38;5;109m",
    h3: "\x1b[38;5;111m",
    h4: "\x1b[38;5;152m",
    h5: "\x1b[38;5;144m",
    h6: "\x1b[38;5;139m",
    emphasis: "\x1b[38;5;144m",
    strong: "\x1b[38;5;110m",
    emphasis_strong: "\x1b[38;5;110m",
    code_inline: "\x1b[38;5;109m",
    code_block: "\x1b[38;5;253m",
    quote: "\x1b[38;5;60m",
    list_marker: "\x1b[38;5;111m",
    link_text: "\x1b[38;5;110m",
    link_url: "\x1b[38;5;60m",
    thematic_break: "\x1b[38;5;59m",
};

pub const ONE_DARK: Palette = Palette {
    text: "\x1b[38;5;188m",
    h1: "\x1b[38;5;204m",
    h2: "\x1b[38;5;39m",
    h3: "\x1b[38;5;170m",
    h4: "\x1b[38;5;114m",
    h5: "\x1b[38;5;180m",
    h6: "\x1b[38;5;73m",
    emphasis: "\x1b[38;5;180m",
    strong: "\x1b[38;5;204m",
    emphasis_strong: "\x1b[38;5;204m",
    code_inline: "\x1b[38;5;114m",
    code_block: "\x1b[38;5;188m",
    quote: "\x1b[38;5;59m",
    list_marker: "\x1b[38;5;39m",
    link_text: "\x1b[38;5;39m",
    link_url: "\x1b[38;5;59m",
    thematic_break: "\x1b[38;5;59m",
};

pub const ONE_LIGHT: Palette = Palette {
    text: "\x1b[38;5;237m",
    h1: "\x1b[38;5;161m",
    h2: "\x1b[38;5;26m",
    h3: "\x1b[38;5;91m",
    h4: "\x1b[38;5;28m",
    h5: "\x1b[38;5;94m",
    h6: "\x1b[38;5;30m",
    emphasis: "\x1b[38;5;94m",
    strong: "\x1b[38;5;161m",
    emphasis_strong: "\x1b[38;5;161m",
    code_inline: "\x1b[38;5;28m",
    code_block: "\x1b[38;5;237m",
    quote: "\x1b[38;5;247m",
    list_marker: "\x1b[38;5;26m",
    link_text: "\x1b[38;5;26m",
    link_url: "\x1b[38;5;247m",
    thematic_break: "\x1b[38;5;247m",
};

pub const SOLARIZED_DARK: Palette = Palette {
    text: "\x1b[38;5;244m",
    h1: "\x1b[38;5;166m",
    h2: "\x1b[38;5;136m",
    h3: "\x1b[38;5;64m",
    h4: "\x1b[38;5;37m",
    h5: "\x1b[38;5;33m",
    h6: "\x1b[38;5;61m",
    emphasis: "\x1b[38;5;136m",
    strong: "\x1b[38;5;166m",
    emphasis_strong: "\x1b[38;5;166m",
    code_inline: "\x1b[38;5;37m",
    code_block: "\x1b[38;5;247m",
    quote: "\x1b[38;5;240m",
    list_marker: "\x1b[38;5;136m",
    link_text: "\x1b[38;5;33m",
    link_url: "\x1b[38;5;240m",
    thematic_break: "\x1b[38;5;240m",
};

pub const SOLARIZED_LIGHT: Palette = Palette {
    text: "\x1b[38;5;241m",
    h1: "\x1b[38;5;166m",
    h2: "\x1b[38;5;136m",
    h3: "\x1b[38;5;64m",
    h4: "\x1b[38;5;37m",
    h5: "\x1b[38;5;33m",
    h6: "\x1b[38;5;61m",
    emphasis: "\x1b[38;5;136m",
    strong: "\x1b[38;5;166m",
    emphasis_strong: "\x1b[38;5;166m",
    code_inline: "\x1b[38;5;37m",
    code_block: "\x1b[38;5;241m",
    quote: "\x1b[38;5;245m",
    list_marker: "\x1b[38;5;136m",
    link_text: "\x1b[38;5;33m",
    link_url: "\x1b[38;5;245m",
    thematic_break: "\x1b[38;5;245m",
};

pub const GITHUB_DARK: Palette = Palette {
    text: "\x1b[38;5;252m",
    h1: "\x1b[38;5;75m",
    h2: "\x1b[38;5;75m",
    h3: "\x1b[38;5;111m",
    h4: "\x1b[38;5;117m",
    h5: "\x1b[38;5;153m",
    h6: "\x1b[38;5;246m",
    emphasis: "",
    strong: "",
    emphasis_strong: "",
    code_inline: "\x1b[38;5;210m",
    code_block: "\x1b[38;5;252m",
    quote: "\x1b[38;5;246m",
    list_marker: "\x1b[38;5;75m",
    link_text: "\x1b[38;5;75m",
    link_url: "\x1b[38;5;246m",
    thematic_break: "\x1b[38;5;240m",
};

pub const GITHUB_LIGHT: Palette = Palette {
    text: "\x1b[38;5;235m",
    h1: "\x1b[38;5;25m",
    h2: "\x1b[38;5;25m",
    h3: "\x1b[38;5;26m",
    h4: "\x1b[38;5;27m",
    h5: "\x1b[38;5;61m",
    h6: "\x1b[38;5;244m",
    emphasis: "",
    strong: "",
    emphasis_strong: "",
    code_inline: "\x1b[38;5;160m",
    code_block: "\x1b[38;5;235m",
    quote: "\x1b[38;5;244m",
    list_marker: "\x1b[38;5;25m",
    link_text: "\x1b[38;5;25m",
    link_url: "\x1b[38;5;244m",
    thematic_break: "\x1b[38;5;250m",
};

pub const TOKYO_NIGHT: Palette = Palette {
    text: "\x1b[38;5;146m",
    h1: "\x1b[38;5;111m",
    h2: "\x1b[38;5;141m",
    h3: "\x1b[38;5;117m",
    h4: "\x1b[38;5;115m",
    h5: "\x1b[38;5;179m",
    h6: "\x1b[38;5;210m",
    emphasis: "\x1b[38;5;179m",
    strong: "\x1b[38;5;111m",
    emphasis_strong: "\x1b[38;5;111m",
    code_inline: "\x1b[38;5;115m",
    code_block: "\x1b[38;5;146m",
    quote: "\x1b[38;5;60m",
    list_marker: "\x1b[38;5;141m",
    link_text: "\x1b[38;5;117m",
    link_url: "\x1b[38;5;60m",
    thematic_break: "\x1b[38;5;60m",
};

pub const CATPPUCCIN_MOCHA: Palette = Palette {
    text: "\x1b[38;5;189m",
    h1: "\x1b[38;5;183m",
    h2: "\x1b[38;5;117m",
    h3: "\x1b[38;5;152m",
    h4: "\x1b[38;5;151m",
    h5: "\x1b[38;5;223m",
    h6: "\x1b[38;5;210m",
    emphasis: "\x1b[38;5;223m",
    strong: "\x1b[38;5;183m",
    emphasis_strong: "\x1b[38;5;183m",
    code_inline: "\x1b[38;5;151m",
    code_block: "\x1b[38;5;189m",
    quote: "\x1b[38;5;103m",
    list_marker: "\x1b[38;5;117m",
    link_text: "\x1b[38;5;117m",
    link_url: "\x1b[38;5;103m",
    thematic_break: "\x1b[38;5;103m",
};

pub const ROSE_PINE: Palette = Palette {
    text: "\x1b[38;5;255m",
    h1: "\x1b[38;5;217m",
    h2: "\x1b[38;5;181m",
    h3: "\x1b[38;5;152m",
    h4: "\x1b[38;5;109m",
    h5: "\x1b[38;5;223m",
    h6: "\x1b[38;5;139m",
    emphasis: "\x1b[38;5;223m",
    strong: "\x1b[38;5;217m",
    emphasis_strong: "\x1b[38;5;217m",
    code_inline: "\x1b[38;5;152m",
    code_block: "\x1b[38;5;255m",
    quote: "\x1b[38;5;102m",
    list_marker: "\x1b[38;5;181m",
    link_text: "\x1b[38;5;152m",
    link_url: "\x1b[38;5;102m",
    thematic_break: "\x1b[38;5;102m",
};

pub const EVERFOREST: Palette = Palette {
    text: "\x1b[38;5;223m",
    h1: "\x1b[38;5;167m",
    h2: "\x1b[38;5;172m",
    h3: "\x1b[38;5;143m",
    h4: "\x1b[38;5;108m",
    h5: "\x1b[38;5;109m",
    h6: "\x1b[38;5;175m",
    emphasis: "\x1b[38;5;143m",
    strong: "\x1b[38;5;167m",
    emphasis_strong: "\x1b[38;5;167m",
    code_inline: "\x1b[38;5;108m",
    code_block: "\x1b[38;5;223m",
    quote: "\x1b[38;5;245m",
    list_marker: "\x1b[38;5;172m",
    link_text: "\x1b[38;5;109m",
    link_url: "\x1b[38;5;245m",
    thematic_break: "\x1b[38;5;243m",
};
