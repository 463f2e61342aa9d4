use std::sync::Arc;

use crate::buffer::compress_bound;
use crate::codec::Codec;

/// Worst-case compressed size for an input of the given length.
pub type BoundFn = fn(usize) -> usize;

/// Immutable catalog entry for one benchmarkable codec configuration.
///
/// Several descriptors may share one implementation and differ only in
/// `additional_param` (e.g. zstd at window logs 22 and 24).
#[derive(Clone)]
pub struct CodecDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub first_level: i32,
    pub last_level: i32,
    pub additional_param: i32,
    /// Largest input a single compress call accepts; 0 means unlimited.
    pub max_block_size: usize,
    pub bound: BoundFn,
    /// Decompression yields a derived result rather than the original bytes,
    /// so the round-trip check cannot apply.
    pub query_only: bool,
    pub codec: Arc<dyn Codec>,
}

impl CodecDescriptor {
    pub fn new(
        name: &'static str,
        version: &'static str,
        levels: (i32, i32),
        codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            name,
            version,
            first_level: levels.0,
            last_level: levels.1,
            additional_param: 0,
            max_block_size: 0,
            bound: compress_bound,
            query_only: false,
            codec,
        }
    }

    pub fn with_param(mut self, param: i32) -> Self {
        self.additional_param = param;
        self
    }

    pub fn with_max_block_size(mut self, size: usize) -> Self {
        self.max_block_size = size;
        self
    }

    pub fn with_bound(mut self, bound: BoundFn) -> Self {
        self.bound = bound;
        self
    }

    pub fn query_only(mut self) -> Self {
        self.query_only = true;
        self
    }

    pub fn accepts_level(&self, level: i64) -> bool {
        level >= self.first_level as i64 && level <= self.last_level as i64
    }

    /// Display label for a run at `level`, e.g. `zstd 0.13 -3`.
    ///
    /// Codecs with a single level omit it.
    pub fn label(&self, level: i32) -> String {
        let mut label = self.name.to_string();
        if !self.version.is_empty() {
            label.push(' ');
            label.push_str(self.version);
        }
        if self.first_level != self.last_level {
            label.push_str(&format!(" -{level}"));
        }
        label
    }
}

impl std::fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("levels", &(self.first_level..=self.last_level))
            .field("additional_param", &self.additional_param)
            .field("max_block_size", &self.max_block_size)
            .field("query_only", &self.query_only)
            .finish()
    }
}

/// Named shorthand for a `/`-separated encoder list.
#[derive(Debug, Clone, Copy)]
pub struct AliasDescriptor {
    pub name: &'static str,
    pub expansion: &'static str,
}

/// Process-wide catalog of codecs and aliases, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    codecs: Vec<CodecDescriptor>,
    aliases: Vec<AliasDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a codec. A later registration under an existing name replaces it.
    pub fn register(&mut self, desc: CodecDescriptor) -> &mut Self {
        match self.codecs.iter().position(|c| c.name == desc.name) {
            Some(idx) => self.codecs[idx] = desc,
            None => self.codecs.push(desc),
        }
        self
    }

    pub fn register_alias(&mut self, name: &'static str, expansion: &'static str) -> &mut Self {
        let alias = AliasDescriptor { name, expansion };
        match self.aliases.iter().position(|a| a.name == name) {
            Some(idx) => self.aliases[idx] = alias,
            None => self.aliases.push(alias),
        }
        self
    }

    pub fn codec_index(&self, name: &str) -> Option<usize> {
        self.codecs.iter().position(|c| c.name == name)
    }

    pub fn codec(&self, name: &str) -> Option<&CodecDescriptor> {
        self.codecs.iter().find(|c| c.name == name)
    }

    pub fn codec_at(&self, idx: usize) -> &CodecDescriptor {
        &self.codecs[idx]
    }

    pub fn alias(&self, name: &str) -> Option<&AliasDescriptor> {
        self.aliases.iter().find(|a| a.name == name)
    }

    pub fn codecs(&self) -> &[CodecDescriptor] {
        &self.codecs
    }

    pub fn aliases(&self) -> &[AliasDescriptor] {
        &self.aliases
    }
}
