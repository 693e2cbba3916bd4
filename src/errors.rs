//! Error types with rich diagnostics using miette
//!
//! Load errors carry source spans so tokenizer failures point at the
//! offending markup. Render errors signal defects, not bad input.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

// ============================================================================
// Load Errors
// ============================================================================

/// Errors that make a document fail to load.
///
/// The lenient entry points ([`crate::SvgLoader::load`] and friends) log these
/// and return `None`; the `try_` variants hand them to the caller.
#[derive(Error, Diagnostic, Debug)]
pub enum LoadError {
    #[error("could not read {locator}")]
    #[diagnostic(code(svgscene::load::io))]
    Io {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{locator} is not valid UTF-8")]
    #[diagnostic(code(svgscene::load::decode))]
    Decode {
        locator: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("malformed markup: {message}")]
    #[diagnostic(code(svgscene::load::xml))]
    Xml {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("tokenizer stopped here")]
        span: SourceSpan,
    },

    #[error("no recognized root element in {locator}")]
    #[diagnostic(
        code(svgscene::load::empty_document),
        help("the outermost element must be one of the supported tags, usually <svg>")
    )]
    EmptyDocument { locator: String },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors raised while rendering a built document.
///
/// These indicate a structural invariant violation (a content model the
/// layout engine cannot handle) or a reference cycle in the input, and are
/// distinct from load failures.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("cannot lay out <{tag}> as a text segment")]
    #[diagnostic(
        code(svgscene::render::unsupported_text_segment),
        help("text containers only hold character data, <tspan> and <textPath>")
    )]
    UnsupportedTextSegment { tag: &'static str },

    #[error("reference cycle through <{tag}>")]
    #[diagnostic(code(svgscene::render::reference_cycle))]
    ReferenceCycle { tag: &'static str },
}
