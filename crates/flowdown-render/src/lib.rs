//! Streaming Markdown to ANSI rendering core.
//!
//! Built for streaming: parsing is incremental from any [`std::io::Read`]
//! and emits a style-aware token stream that is wrapped only at the final
//! output step. The renderer never buffers full documents and handles
//! unbounded streams as they arrive.
//!
//! Core properties:
//! - Streaming-first parsing, one read buffer at a time
//! - Width-independent tokens; wrap/reflow happens last, in the sink
//! - Hot-path allocations near zero after warmup via reusable buffers
//! - Theme-driven styling through opaque ANSI prefixes
//!
//! ```no_run
//! use flowdown_render::{render, RenderOptions};
//!
//! let source = "# Hello\n\nMarkdown in, ANSI out.\n";
//! render(
//!     source.as_bytes(),
//!     std::io::stdout(),
//!     80,
//!     &flowdown_theme::default_theme(),
//!     RenderOptions::default(),
//! )
//! .unwrap();
//! ```

pub mod frontmatter;
pub mod osc8;
pub mod parser;
pub mod render;
pub mod simulate;
pub mod sink;
pub mod validate;
pub mod wrap;

pub use frontmatter::FrontMatterFilter;
pub use osc8::{detect_osc8_support, OSC8_END, OSC8_START};
pub use parser::LiveParser;
pub use render::{parse, parse_with, render, RenderOptions};
pub use simulate::stream_simulate;
pub use sink::{StreamRenderer, TokenSink};
pub use validate::validate_input;
pub use wrap::{fit_url, printable_width, strip_ansi_codes, truncate_with_ellipsis};
