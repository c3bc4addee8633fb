// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

//! Registry of waveform generator functions.
//!
//! A generator produces a waveform at compile time from constant arguments.
//! Every generator takes the number of samples as its first parameter, `samples`,
//! which is what the duration resolver reads to time a `play` of the generated waveform.

use crate::symbols::Signature;
use crate::types::{IsConst, Type};

/// Name of the generator whose content is injected at run time.
pub const PLACEHOLDER: &str = "placeholder";

/// Name of the parameter giving a generated waveform's length.
pub const SAMPLES_PARAM: &str = "samples";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generator {
    name: String,
    signature: Signature,
}

impl Generator {
    pub fn new<T: ToString>(name: T, params: &[(&str, Type)]) -> Generator {
        let params = params
            .iter()
            .map(|(name, ty)| (name.to_string(), ty.clone()))
            .collect();
        Generator {
            name: name.to_string(),
            signature: Signature::new(params, Some(Type::Waveform)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Static table of generator signatures. Injected into the analyzer and the duration resolver
/// so that other backends can supply their own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorRegistry {
    generators: Vec<Generator>,
}

impl GeneratorRegistry {
    pub fn new(generators: Vec<Generator>) -> GeneratorRegistry {
        GeneratorRegistry { generators }
    }

    pub fn empty() -> GeneratorRegistry {
        GeneratorRegistry::new(Vec::new())
    }

    /// The waveform generators of the ZI sequencer, plus `placeholder`.
    pub fn zi() -> GeneratorRegistry {
        let int = || Type::Int(None, IsConst::False);
        let float = || Type::Float(None, IsConst::False);
        let samples = (SAMPLES_PARAM, int());
        let generators = vec![
            Generator::new(PLACEHOLDER, &[samples.clone()]),
            Generator::new("zeros", &[samples.clone()]),
            Generator::new("ones", &[samples.clone()]),
            Generator::new("rect", &[samples.clone(), ("amplitude", float())]),
            Generator::new(
                "gauss",
                &[
                    samples.clone(),
                    ("amplitude", float()),
                    ("position", int()),
                    ("width", float()),
                ],
            ),
            Generator::new(
                "drag",
                &[
                    samples.clone(),
                    ("amplitude", float()),
                    ("position", int()),
                    ("width", float()),
                ],
            ),
            Generator::new(
                "blackman",
                &[samples.clone(), ("amplitude", float()), ("alpha", float())],
            ),
            Generator::new("hamming", &[samples.clone(), ("amplitude", float())]),
            Generator::new("hann", &[samples.clone(), ("amplitude", float())]),
            Generator::new(
                "sine",
                &[
                    samples.clone(),
                    ("amplitude", float()),
                    ("phase_offset", float()),
                    ("n_periods", float()),
                ],
            ),
            Generator::new(
                "cosine",
                &[
                    samples.clone(),
                    ("amplitude", float()),
                    ("phase_offset", float()),
                    ("n_periods", float()),
                ],
            ),
            Generator::new(
                "sinc",
                &[
                    samples.clone(),
                    ("amplitude", float()),
                    ("position", int()),
                    ("beta", float()),
                ],
            ),
            Generator::new(
                "ramp",
                &[
                    samples.clone(),
                    ("start_level", float()),
                    ("end_level", float()),
                ],
            ),
            Generator::new(
                "chirp",
                &[
                    samples,
                    ("amplitude", float()),
                    ("start_freq", float()),
                    ("stop_freq", float()),
                ],
            ),
        ];
        GeneratorRegistry::new(generators)
    }

    pub fn get(&self, name: &str) -> Option<&Generator> {
        self.generators.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Generator> {
        self.generators.iter()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::zi()
    }
}
