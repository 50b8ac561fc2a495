//! Per-owner collection of named forks and their replay points.
//!
//! Replay points follow a checkpoint-at-first-use rule: [`ForkRegistry::checkpoint`]
//! records, for each fork, the seed it held when it was first handed out, so
//! everything drawn from a fork since its creation can be replayed. Use
//! [`ForkRegistry::checkpoint_current`] to anchor replay at the present state
//! instead.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::derive::derive;
use crate::diag::{default_sink, DiagnosticSink};
use crate::seed::RootSeed;
use crate::stream::{SharedStream, Stream};

pub struct ForkRegistry {
    owner: String,
    root: u32,
    forks: HashMap<String, SharedStream>,
    /// Seed most recently derived for each fork.
    anchors: HashMap<String, u32>,
    origin_seeds: HashMap<String, u32>,
    sink: Arc<dyn DiagnosticSink>,
}

impl ForkRegistry {
    pub fn new(owner: impl Into<String>, seed: impl Into<RootSeed>) -> Self {
        Self::with_sink(owner, seed, default_sink())
    }

    pub fn with_sink(
        owner: impl Into<String>,
        seed: impl Into<RootSeed>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self::from_root(owner.into(), seed.into().resolve(), sink)
    }

    fn from_root(owner: String, root: u32, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            owner,
            root,
            forks: HashMap::new(),
            anchors: HashMap::new(),
            origin_seeds: HashMap::new(),
            sink,
        }
    }

    /// A child registry rooted at this registry's derivation for `label`.
    pub fn nested(&self, owner: impl Into<String>, label: &str) -> Self {
        Self::from_root(owner.into(), derive(self.root, label), Arc::clone(&self.sink))
    }

    /// Handle to the fork named `label`, created on first request.
    pub fn fork(&mut self, label: &str) -> SharedStream {
        if let Some(stream) = self.forks.get(label) {
            return stream.clone();
        }
        let seed = derive(self.root, label);
        let stream = SharedStream::new(Stream::new(seed, label));
        self.anchors.insert(label.to_string(), stream.origin_seed());
        self.forks.insert(label.to_string(), stream.clone());
        stream
    }

    /// Record every known fork's first-use seed as its replay point.
    pub fn checkpoint(&mut self) {
        for (label, anchor) in &self.anchors {
            self.origin_seeds.insert(label.clone(), *anchor);
        }
        self.sink.info(&format!(
            "{}: checkpointed {} fork(s) at first use",
            self.owner,
            self.anchors.len()
        ));
    }

    /// Record every known fork's current state as its replay point.
    pub fn checkpoint_current(&mut self) {
        for (label, stream) in &self.forks {
            self.origin_seeds.insert(label.clone(), stream.state());
        }
        self.sink.info(&format!(
            "{}: checkpointed {} fork(s) at current state",
            self.owner,
            self.forks.len()
        ));
    }

    /// Reset `label` to its replay point. Returns whether a reset happened.
    pub fn replay(&mut self, label: &str) -> bool {
        let Some(stream) = self.forks.get(label) else {
            self.sink
                .info(&format!("{}: replay of unknown fork {label:?}; skipped", self.owner));
            return false;
        };
        match self.origin_seeds.get(label) {
            Some(&seed) => {
                stream.reset_to(seed);
                true
            }
            None => {
                self.sink.info(&format!(
                    "{}: fork {label:?} has no checkpoint; replay skipped",
                    self.owner
                ));
                false
            }
        }
    }

    /// Replay every known fork. Returns how many were reset.
    pub fn replay_all(&mut self) -> usize {
        let labels: Vec<String> = self.forks.keys().cloned().collect();
        labels.iter().filter(|label| self.replay(label)).count()
    }

    /// Move the registry to a new root seed.
    ///
    /// Existing forks are re-derived in place, so outstanding handles follow
    /// the new root. Checkpointed replay points are kept.
    pub fn reseed(&mut self, seed: impl Into<RootSeed>) {
        self.root = seed.into().resolve();
        for (label, stream) in &self.forks {
            let seed = derive(self.root, label);
            stream.reset_to(seed);
            self.anchors.insert(label.clone(), seed);
        }
        self.sink.info(&format!(
            "{}: reseeded {} fork(s) from root {}",
            self.owner,
            self.forks.len(),
            self.root
        ));
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn root_seed(&self) -> u32 {
        self.root
    }

    pub fn replay_point(&self, label: &str) -> Option<u32> {
        self.origin_seeds.get(label).copied()
    }

    /// Known labels in sorted order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.forks.keys().cloned().collect();
        labels.sort();
        labels
    }

    /// Current state of every fork, keyed by label.
    pub fn states(&self) -> BTreeMap<String, u32> {
        self.forks
            .iter()
            .map(|(label, stream)| (label.clone(), stream.state()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }
}

impl std::fmt::Debug for ForkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkRegistry")
            .field("owner", &self.owner)
            .field("root", &self.root)
            .field("forks", &self.labels())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::testing::RecordingSink;
    use crate::source::RandomSource;
    use proptest::prelude::*;

    fn floats(stream: &mut SharedStream, count: usize) -> Vec<f64> {
        (0..count).map(|_| stream.float()).collect()
    }

    #[test]
    fn fork_returns_the_same_stream() {
        let mut registry = ForkRegistry::new("terrain", 7i64);
        let mut first = registry.fork("noise");
        let second = registry.fork("noise");
        assert!(first.ptr_eq(&second));
        first.draw();
        assert_eq!(second.state(), first.state());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn fork_seed_comes_from_root_and_label() {
        let mut registry = ForkRegistry::new("terrain", 7i64);
        let stream = registry.fork("noise");
        assert_eq!(stream.origin_seed(), derive(7, "noise"));
        assert_eq!(stream.label(), "noise");
    }

    #[test]
    fn scenario_1337() {
        let mut registry = ForkRegistry::new("scenario", 1337i64);
        let mut a = registry.fork("a");
        let expected = floats(&mut a, 3);
        registry.checkpoint();

        let mut b = registry.fork("b");
        floats(&mut b, 5);

        assert!(registry.replay("a"));
        assert_eq!(floats(&mut a, 3), expected);

        let mut fresh = ForkRegistry::new("scenario", 1337i64);
        let mut fresh_a = fresh.fork("a");
        assert_eq!(floats(&mut fresh_a, 3), expected);
    }

    #[test]
    fn replay_without_checkpoint_is_a_no_op() {
        let sink = Arc::new(RecordingSink::default());
        let mut registry = ForkRegistry::with_sink("late", 3i64, sink.clone());
        registry.checkpoint();
        let mut late = registry.fork("late");
        late.draw();
        let state = late.state();
        assert!(!registry.replay("late"));
        assert_eq!(late.state(), state);
        assert!(!registry.replay("missing"));
        assert_eq!(sink.count("info"), 3);
        assert_eq!(sink.count("warn"), 0);
        assert_eq!(sink.count("error"), 0);
    }

    #[test]
    fn replay_all_resets_every_checkpointed_fork() {
        let mut registry = ForkRegistry::new("belt", 99i64);
        let mut rocks = registry.fork("rocks");
        let mut dust = registry.fork("dust");
        let rocks_first = floats(&mut rocks, 4);
        let dust_first = floats(&mut dust, 2);
        registry.checkpoint();
        let mut untracked = registry.fork("untracked");
        untracked.draw();

        assert_eq!(registry.replay_all(), 2);
        assert_eq!(floats(&mut rocks, 4), rocks_first);
        assert_eq!(floats(&mut dust, 2), dust_first);
    }

    #[test]
    fn replay_survives_reseed() {
        let mut registry = ForkRegistry::new("stars", 5i64);
        let mut stars = registry.fork("starfield");
        let before = floats(&mut stars, 3);
        registry.checkpoint();

        registry.reseed(6i64);
        assert_eq!(stars.state(), derive(6, "starfield"));
        assert_eq!(stars.origin_seed(), derive(5, "starfield"));
        let reseeded = floats(&mut stars, 3);
        assert_ne!(reseeded, before);

        registry.replay("starfield");
        assert_eq!(floats(&mut stars, 3), before);

        registry.checkpoint();
        assert_eq!(registry.replay_point("starfield"), Some(derive(6, "starfield")));
        registry.replay("starfield");
        assert_eq!(floats(&mut stars, 3), reseeded);
    }

    #[test]
    fn nested_registries_are_independent_of_parent_draws() {
        let mut parent = ForkRegistry::new("world", 11i64);
        let mut early = parent.nested("fragments", "fragments");
        parent.fork("fragments").draw();
        let mut late = parent.nested("fragments", "fragments");
        assert_eq!(early.root_seed(), late.root_seed());
        assert_eq!(early.fork("shard").draw(), late.fork("shard").draw());
    }

    #[test]
    fn labels_are_sorted() {
        let mut registry = ForkRegistry::new("ids", "text-root");
        registry.fork("zeta");
        registry.fork("alpha");
        assert_eq!(registry.labels(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(registry.states().len(), 2);
        assert_eq!(registry.owner(), "ids");
    }

    proptest! {
        #[test]
        fn checkpoint_current_replays_the_next_draws(
            seed in any::<i64>(),
            n in 0usize..64,
            m in 1usize..64,
        ) {
            let mut registry = ForkRegistry::new("prop", seed);
            let mut stream = registry.fork("replay");
            floats(&mut stream, n);
            registry.checkpoint_current();
            let recorded = floats(&mut stream, m);
            registry.replay("replay");
            prop_assert_eq!(floats(&mut stream, m), recorded);
        }

        #[test]
        fn sibling_forks_do_not_perturb_each_other(seed in any::<i64>(), noise in 0usize..32) {
            let mut quiet = ForkRegistry::new("prop", seed);
            let mut noisy = ForkRegistry::new("prop", seed);
            let mut noisy_b = noisy.fork("b");
            floats(&mut noisy_b, noise);
            prop_assert_eq!(
                floats(&mut quiet.fork("a"), 8),
                floats(&mut noisy.fork("a"), 8)
            );
        }
    }
}
