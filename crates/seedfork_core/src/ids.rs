//! Adapter tying a third-party component's identifier generation to a fork.
//!
//! The component exposes an [`IdHook`]. [`DeterministicIds::attach`] swaps in a
//! generator backed by a named fork and keeps whatever it displaced;
//! [`DeterministicIds::detach`] hands that generator back.

use crate::source::{AmbientSource, RandomSource};
use crate::stream::SharedStream;

pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Identifier hook offered by a collaborator that mints its own ids.
pub trait IdHook {
    /// Install `generator`, returning the previous one.
    fn swap_generator(&mut self, generator: Box<dyn IdGenerator>) -> Box<dyn IdGenerator>;
}

/// Generator a collaborator falls back to when nothing is attached. Draws
/// from the ambient primitive, so it is visible to the guard.
#[derive(Debug, Default)]
pub struct AmbientIds;

impl IdGenerator for AmbientIds {
    fn next_id(&mut self) -> String {
        AmbientSource.uuid("ambient")
    }
}

/// Generator minting identifiers from a fork.
#[derive(Debug)]
pub struct ForkedIds {
    stream: SharedStream,
    namespace: String,
}

impl ForkedIds {
    pub fn new(stream: SharedStream, namespace: impl Into<String>) -> Self {
        Self {
            stream,
            namespace: namespace.into(),
        }
    }
}

impl IdGenerator for ForkedIds {
    fn next_id(&mut self) -> String {
        self.stream.uuid(&self.namespace)
    }
}

/// Attachment record holding the generator displaced from a hook.
#[must_use = "detach to hand the original generator back"]
pub struct DeterministicIds {
    displaced: Box<dyn IdGenerator>,
}

impl DeterministicIds {
    pub fn attach<H: IdHook + ?Sized>(
        hook: &mut H,
        stream: SharedStream,
        namespace: impl Into<String>,
    ) -> Self {
        let displaced = hook.swap_generator(Box::new(ForkedIds::new(stream, namespace)));
        Self { displaced }
    }

    /// Restore the displaced generator, returning the fork-backed one.
    pub fn detach<H: IdHook + ?Sized>(self, hook: &mut H) -> Box<dyn IdGenerator> {
        hook.swap_generator(self.displaced)
    }
}
