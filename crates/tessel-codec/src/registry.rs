//! Codec selection by format identifier.
//!
//! The canvas depends only on the [`Codec`] trait; concrete adapters
//! are looked up here by a format identifier string ("png", "jpeg",
//! ...). Deciding which identifier a given filename maps to is a
//! dispatch-layer concern outside this crate.

use std::collections::HashMap;

use crate::{Codec, ImageCodec};

/// A registry of codec adapters keyed on format identifier.
pub struct CodecRegistry {
    codecs: HashMap<String, Box<dyn Codec>>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("CodecRegistry").field("formats", &ids).finish()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry preloaded with the `image`-backed adapters:
    /// "png", "jpeg", "bmp", and "webp" (decode-only).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("png", Box::new(ImageCodec::png()));
        registry.register("jpeg", Box::new(ImageCodec::jpeg()));
        registry.register("bmp", Box::new(ImageCodec::bmp()));
        registry.register("webp", Box::new(ImageCodec::webp()));
        registry
    }

    /// Register (or replace) the adapter for a format identifier.
    pub fn register(&mut self, format_id: impl Into<String>, codec: Box<dyn Codec>) {
        self.codecs.insert(format_id.into(), codec);
    }

    /// Look up the adapter for a format identifier.
    #[must_use]
    pub fn get(&self, format_id: &str) -> Option<&dyn Codec> {
        self.codecs.get(format_id).map(Box::as_ref)
    }

    /// Registered format identifiers, in no particular order.
    pub fn formats(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }
}
