// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

// Compilations cached by a digest of everything that determines them.

use crate::compiler::{Compilation, Compiler};
use hashbrown::HashMap;
use oqp_semantics::asg::Program;
use oqp_semantics::inputs::Inputs;
use oqp_setup::{SetupConfig, SetupError};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(
        program: &Program,
        setup: &SetupConfig,
        inputs: &Inputs,
        compiler: &Compiler,
    ) -> Result<CacheKey, SetupError> {
        let mut hasher = blake3::Hasher::new();
        // The debug form includes every annotation, so an analyzed program and its
        // source do not collide.
        hasher.update(format!("{program:?}").as_bytes());
        hasher.update(setup.to_json()?.as_bytes());
        // Serializing maps of plain values into a string cannot fail.
        let inputs = serde_json::to_string(inputs).unwrap_or_default();
        hasher.update(inputs.as_bytes());
        let config = serde_json::to_string(compiler.config()).unwrap_or_default();
        hasher.update(config.as_bytes());
        hasher.update(format!("{:?}", compiler.registry()).as_bytes());
        Ok(CacheKey(*hasher.finalize().as_bytes()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Finished compilations, owned by the caller.
/// Only compilations without errors are stored.
#[derive(Debug, Default)]
pub struct CompileCache {
    entries: HashMap<CacheKey, Compilation>,
    hits: usize,
    misses: usize,
}

impl CompileCache {
    pub fn new() -> CompileCache {
        CompileCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Compilation> {
        self.entries.get(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the cached compilation for these arguments, compiling on a miss.
    pub fn compile(
        &mut self,
        compiler: &Compiler,
        program: Program,
        setup: &SetupConfig,
        inputs: &Inputs,
    ) -> Result<Compilation, SetupError> {
        let key = CacheKey::new(&program, setup, inputs, compiler)?;
        if let Some(compilation) = self.entries.get(&key) {
            log::debug!("compile cache hit {key}");
            self.hits += 1;
            return Ok(compilation.clone());
        }
        log::debug!("compile cache miss {key}");
        self.misses += 1;
        let compilation = compiler.compile(program, setup, inputs);
        if !compilation.any_errors() {
            self.entries.insert(key, compilation.clone());
        }
        Ok(compilation)
    }
}
