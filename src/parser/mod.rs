//! Document loading.
//!
//! [`SvgLoader`] reads SVG markup from a byte stream, a file or a string.
//! Gzip-compressed input (`.svgz`) is detected by its magic bytes and
//! decompressed transparently. The markup is read as a forward-only event
//! stream: no DTDs or external entities are ever fetched.
//!
//! The lenient entry points (`load*`) log failures and return `None`; the
//! `try_load*` variants return a [`LoadError`] instead.

mod builder;
mod registry;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, ErrorKind, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use miette::NamedSource;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::document::Document;
use crate::errors::LoadError;
use crate::log::{debug, warn};

use builder::DocumentBuilder;
pub use registry::NameRegistry;

/// Leading bytes of a gzip stream
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Locator reported for documents loaded from memory
const IN_MEMORY: &str = "<memory>";

/// Loader settings
#[derive(Clone, Debug)]
pub struct LoaderOptions {
    /// Elements nested deeper than this are skipped with their subtree
    pub max_depth: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        LoaderOptions { max_depth: 512 }
    }
}

impl LoaderOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Loads SVG documents into scene trees
#[derive(Clone, Debug, Default)]
pub struct SvgLoader {
    options: LoaderOptions,
}

impl SvgLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoaderOptions) -> Self {
        SvgLoader { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    // ========================================================================
    // Lenient entry points
    // ========================================================================

    /// Load from a byte stream; `locator` names it in diagnostics.
    pub fn load(&self, reader: impl Read, locator: &str) -> Option<Document> {
        lenient(self.try_load(reader, locator))
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Option<Document> {
        lenient(self.try_load_path(path))
    }

    pub fn load_bytes(&self, bytes: &[u8]) -> Option<Document> {
        lenient(self.try_load_bytes(bytes))
    }

    pub fn load_str(&self, text: &str) -> Option<Document> {
        lenient(self.try_load_str(text))
    }

    // ========================================================================
    // Fallible entry points
    // ========================================================================

    pub fn try_load(&self, reader: impl Read, locator: &str) -> Result<Document, LoadError> {
        let text = read_source(reader, locator)?;
        self.parse(&text, locator)
    }

    pub fn try_load_path(&self, path: impl AsRef<Path>) -> Result<Document, LoadError> {
        let path = path.as_ref();
        let locator = path.display().to_string();
        let file = File::open(path).map_err(|source| LoadError::Io {
            locator: locator.clone(),
            source,
        })?;
        self.try_load(file, &locator)
    }

    pub fn try_load_bytes(&self, bytes: &[u8]) -> Result<Document, LoadError> {
        self.try_load(bytes, IN_MEMORY)
    }

    pub fn try_load_str(&self, text: &str) -> Result<Document, LoadError> {
        self.parse(text, IN_MEMORY)
    }

    /// Feed the markup event stream into a [`DocumentBuilder`].
    fn parse(&self, text: &str, locator: &str) -> Result<Document, LoadError> {
        let mut reader = Reader::from_reader(text.as_bytes());
        let config = reader.config_mut();
        config.trim_text(false);
        // Mismatched end tags are repaired by the builder, not rejected
        config.check_end_names = false;

        let xml_error = |message: String, position: u64| LoadError::Xml {
            message,
            src: NamedSource::new(locator, text.to_string()),
            span: (usize::try_from(position).unwrap_or(text.len()).min(text.len()), 0).into(),
        };

        let mut builder = DocumentBuilder::new(&self.options);
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let (tag, attributes) = element(&reader, &e);
                    builder.start_element(&tag, attributes);
                }
                Ok(Event::Empty(e)) => {
                    let (tag, attributes) = element(&reader, &e);
                    builder.start_element(&tag, attributes);
                    builder.end_element(&tag);
                }
                Ok(Event::End(e)) => {
                    let local = e.local_name();
                    let tag = decode_name(&reader, local.as_ref());
                    builder.end_element(&tag);
                }
                Ok(Event::Text(e)) => match e.decode() {
                    Ok(text) => builder.characters(&text),
                    Err(err) => {
                        return Err(xml_error(err.to_string(), reader.buffer_position()));
                    }
                },
                Ok(Event::CData(e)) => {
                    let text = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|err| xml_error(err.to_string(), reader.buffer_position()))?;
                    builder.characters(&text);
                }
                Ok(Event::GeneralRef(e)) => {
                    let name = e
                        .decode()
                        .map_err(|err| xml_error(err.to_string(), reader.buffer_position()))?;
                    let entity = format!("&{name};");
                    match quick_xml::escape::unescape(&entity) {
                        Ok(text) => builder.characters(&text),
                        Err(_) => warn!(entity = entity.as_str(), "unknown entity dropped"),
                    }
                }
                Ok(Event::Eof) => break,
                // Declarations, processing instructions, comments, DOCTYPE
                Ok(_) => {}
                Err(err) => {
                    return Err(xml_error(err.to_string(), reader.error_position()));
                }
            }
            buf.clear();
        }

        debug!(locator, "markup read");
        builder.finish().ok_or_else(|| LoadError::EmptyDocument {
            locator: locator.to_string(),
        })
    }
}

fn lenient(result: Result<Document, LoadError>) -> Option<Document> {
    match result {
        Ok(document) => Some(document),
        Err(err) => {
            warn!(error = %err, "failed to load document");
            None
        }
    }
}

/// Read the whole source, inflating it when it starts with the gzip magic.
///
/// Up to two bytes are read for the sniff, however the source splits its
/// reads, and are put back in front of the rest of the stream.
fn read_source(mut reader: impl Read, locator: &str) -> Result<String, LoadError> {
    let io_error = |source| LoadError::Io {
        locator: locator.to_string(),
        source,
    };
    let mut magic = [0u8; 2];
    let mut filled = 0;
    while filled < magic.len() {
        match reader.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(io_error(err)),
        }
    }
    let compressed = magic[..filled] == GZIP_MAGIC;
    let mut stream = Cursor::new(&magic[..filled]).chain(reader);

    let mut bytes = Vec::new();
    if compressed {
        debug!(locator, "gzip stream detected");
        GzDecoder::new(stream).read_to_end(&mut bytes).map_err(io_error)?;
    } else {
        stream.read_to_end(&mut bytes).map_err(io_error)?;
    }
    String::from_utf8(bytes).map_err(|source| LoadError::Decode {
        locator: locator.to_string(),
        source,
    })
}

fn decode_name<'b>(reader: &Reader<&[u8]>, name: &'b [u8]) -> Cow<'b, str> {
    match reader.decoder().decode(name) {
        Ok(name) => name,
        Err(_) => String::from_utf8_lossy(name),
    }
}

/// Local tag name and unescaped attributes of a start tag. Attribute keys
/// keep their prefix (`xlink:href`); malformed attributes are skipped.
fn element(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> (String, HashMap<String, String>) {
    let tag = decode_name(reader, e.local_name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref()).into_owned();
        match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => {
                attributes.entry(key).or_insert_with(|| value.into_owned());
            }
            Err(_) => warn!(tag = tag.as_str(), attribute = key.as_str(), "undecodable attribute skipped"),
        }
    }
    (tag, attributes)
}
