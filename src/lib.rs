//! Load SVG documents into a cross-referenced scene tree and render them onto
//! an abstract drawing surface.
//!
//! ```
//! use svgscene::{RecordingSurface, RenderOptions, SvgLoader};
//!
//! let doc = SvgLoader::new()
//!     .try_load_str(r#"<svg width="20" height="10"><rect width="5" height="5"/></svg>"#)
//!     .unwrap();
//! let mut surface = RecordingSurface::new();
//! doc.render(&mut surface, &RenderOptions::default()).unwrap();
//! assert_eq!(surface.draws().count(), 1);
//! ```
//!
//! Loading happens in two phases: the markup is read into raw elements and
//! every `id` is registered, then each node resolves its attributes with the
//! complete registry at hand, so references may point forward.

pub mod attributes;
pub mod document;
pub mod errors;
pub mod geometry;
pub(crate) mod log;
pub mod nodes;
pub mod parser;
pub mod renderer;
pub mod types;

pub use document::Document;
pub use errors::{LoadError, RenderError};
pub use parser::{LoaderOptions, NameRegistry, SvgLoader};
pub use renderer::{Command, RecordingSurface, RenderOptions, Renderer, Surface};
pub use types::{BBox, Color, Length, Size, Unit};
