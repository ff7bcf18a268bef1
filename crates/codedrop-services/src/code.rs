//! Transfer code generation.

use codedrop_core::constants::{CODE_MAX, CODE_MIN};
use codedrop_core::{AppError, Code};
use rand::Rng;

/// Upper bound on draws for one code. With 900,000 possible values the loop only
/// gets near this when the code space is almost entirely live.
pub const MAX_GENERATION_ATTEMPTS: usize = 10_000;

/// Source of candidate code values.
pub trait CodeSource: Send {
    fn next_candidate(&mut self) -> u32;
}

/// Uniform draws from `CODE_MIN..=CODE_MAX` using the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeSource;

impl CodeSource for RandomCodeSource {
    fn next_candidate(&mut self) -> u32 {
        rand::rng().random_range(CODE_MIN..=CODE_MAX)
    }
}

/// Produces codes that are not currently in use.
pub struct CodeGenerator {
    source: Box<dyn CodeSource>,
    max_attempts: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::with_source(RandomCodeSource, MAX_GENERATION_ATTEMPTS)
    }

    pub fn with_source(source: impl CodeSource + 'static, max_attempts: usize) -> Self {
        Self {
            source: Box::new(source),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draw candidates until one is not `in_use`.
    ///
    /// Must be called while holding the lock that guards the set `in_use` reads,
    /// otherwise two callers can be handed the same code.
    pub fn generate<F>(&mut self, in_use: F) -> Result<Code, AppError>
    where
        F: Fn(&Code) -> bool,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.next_candidate();
            let code = match Code::from_number(candidate) {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!(candidate = candidate, error = %e, "Discarding invalid code candidate");
                    continue;
                }
            };
            if !in_use(&code) {
                if attempt > 1 {
                    tracing::debug!(attempts = attempt, "Code generated after collisions");
                }
                return Ok(code);
            }
        }

        tracing::warn!(
            attempts = self.max_attempts,
            "Code generation exhausted its attempt budget"
        );
        Err(AppError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

/// Replays a fixed list of candidates, then repeats the last one.
#[cfg(test)]
pub(crate) struct ScriptedSource {
    values: Vec<u32>,
    position: usize,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(values: Vec<u32>) -> Self {
        assert!(!values.is_empty());
        Self {
            values,
            position: 0,
        }
    }
}

#[cfg(test)]
impl CodeSource for ScriptedSource {
    fn next_candidate(&mut self) -> u32 {
        let value = self.values[self.position.min(self.values.len() - 1)];
        self.position += 1;
        value
    }
}
