#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Memoized selector framework.
//!
//! A selector derives a value from an immutable state snapshot. It declares
//! how to gather its inputs (raw state fields or other selectors) and a pure
//! combiner that turns those inputs into an output. The [`SelectorContext`]
//! remembers, per selector, the inputs and output of the most recent
//! invocation and skips the combiner when every input is identical to last
//! time (see [`SelectorInput`]).
//!
//! The cache holds exactly one entry per selector. Re-invoking with inputs
//! that were seen earlier but not immediately before is a miss. A combiner
//! error is returned to the caller and never cached.

mod input;

pub use input::SelectorInput;

use std::any::Any;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

/// Name identifying a selector's cache slot.
pub type SelectorId = &'static str;

/// Cache counters for a single selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorStats {
    /// Invocations answered from the cache.
    pub hits: u64,
    /// Invocations that ran the combiner (including ones that failed).
    pub misses: u64,
}

/// Last inputs and output of a selector.
struct Memo<I, O> {
    inputs: I,
    output: Arc<O>,
}

/// Per-pipeline memoization state.
///
/// Owned by whoever drives recomputation; there is no global cache.
#[derive(Default)]
pub struct SelectorContext {
    entries: BTreeMap<SelectorId, Box<dyn Any>>,
    stats: BTreeMap<SelectorId, SelectorStats>,
}

impl std::fmt::Debug for SelectorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorContext")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish()
    }
}

impl SelectorContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached output for `id` if `inputs` are identical to the
    /// previous invocation, otherwise runs `combine` and caches the result.
    ///
    /// # Errors
    ///
    /// Returns whatever error `combine` returns. The error is not cached, so
    /// the next call with the same inputs runs `combine` again.
    pub fn select<I, O, E, F>(&mut self, id: SelectorId, inputs: I, combine: F) -> Result<Arc<O>, E>
    where
        I: SelectorInput,
        O: 'static,
        F: FnOnce(&I) -> Result<O, E>,
    {
        if let Some(memo) = self
            .entries
            .get(id)
            .and_then(|entry| entry.downcast_ref::<Memo<I, O>>())
            && memo.inputs.same_as(&inputs)
        {
            self.stats.entry(id).or_default().hits += 1;
            log::trace!("selector {id}: cache hit");
            return Ok(Arc::clone(&memo.output));
        }

        log::debug!("selector {id}: recomputing");
        self.stats.entry(id).or_default().misses += 1;

        let output = Arc::new(combine(&inputs)?);
        self.entries.insert(
            id,
            Box::new(Memo {
                inputs,
                output: Arc::clone(&output),
            }),
        );

        Ok(output)
    }

    /// Infallible variant of [`Self::select`].
    pub fn compute<I, O, F>(&mut self, id: SelectorId, inputs: I, combine: F) -> Arc<O>
    where
        I: SelectorInput,
        O: 'static,
        F: FnOnce(&I) -> O,
    {
        match self.select(id, inputs, |inputs| Ok::<_, Infallible>(combine(inputs))) {
            Ok(output) => output,
            Err(never) => match never {},
        }
    }

    /// Drops the cached entry for `id`, forcing the next call to recompute.
    pub fn invalidate(&mut self, id: SelectorId) {
        self.entries.remove(id);
    }

    /// Drops every cached entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the counters for `id`.
    #[must_use]
    pub fn stats(&self, id: SelectorId) -> SelectorStats {
        self.stats.get(id).copied().unwrap_or_default()
    }

    /// Returns `true` if `id` currently has a cached output.
    #[must_use]
    pub fn is_cached(&self, id: SelectorId) -> bool {
        self.entries.contains_key(id)
    }
}

/// A declared selector over state `S`.
///
/// `inputs` evaluates the upstream selectors or raw-state accessors and
/// `combine` derives the output from them. Both are plain function pointers
/// so selectors can be declared as `const` items.
pub struct Selector<S: ?Sized, I, O, E> {
    name: SelectorId,
    inputs: fn(&mut SelectorContext, &S) -> Result<I, E>,
    combine: fn(&I) -> Result<O, E>,
}

impl<S: ?Sized, I, O, E> Selector<S, I, O, E> {
    /// Declares a selector.
    pub const fn new(
        name: SelectorId,
        inputs: fn(&mut SelectorContext, &S) -> Result<I, E>,
        combine: fn(&I) -> Result<O, E>,
    ) -> Self {
        Self {
            name,
            inputs,
            combine,
        }
    }

    /// Returns the selector's cache slot name.
    #[must_use]
    pub const fn name(&self) -> SelectorId {
        self.name
    }
}

impl<S: ?Sized, I: SelectorInput, O: 'static, E> Selector<S, I, O, E> {
    /// Evaluates the selector against `state`.
    ///
    /// # Errors
    ///
    /// Propagates errors from upstream selectors and from the combiner.
    pub fn select(&self, ctx: &mut SelectorContext, state: &S) -> Result<Arc<O>, E> {
        let inputs = (self.inputs)(ctx, state)?;
        ctx.select(self.name, inputs, self.combine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn identical_inputs_skip_the_combiner() {
        let mut ctx = SelectorContext::new();
        let data = Arc::new(vec![1, 2, 3]);
        let calls = Cell::new(0);

        let sum = |ctx: &mut SelectorContext| {
            ctx.compute("sum", Arc::clone(&data), |d| {
                calls.set(calls.get() + 1);
                d.iter().sum::<i32>()
            })
        };

        let first = sum(&mut ctx);
        let second = sum(&mut ctx);

        assert_eq!(*first, 6);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.stats("sum"), SelectorStats { hits: 1, misses: 1 });
    }

    #[test]
    fn equal_but_distinct_inputs_recompute() {
        let mut ctx = SelectorContext::new();
        let calls = Cell::new(0);

        for _ in 0..2 {
            ctx.compute("len", Arc::new(vec![1, 2]), |d| {
                calls.set(calls.get() + 1);
                d.len()
            });
        }

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn cache_depth_is_one() {
        let mut ctx = SelectorContext::new();
        let a = Arc::new(1);
        let b = Arc::new(2);
        let calls = Cell::new(0);

        for input in [&a, &b, &a] {
            ctx.compute("double", Arc::clone(input), |v| {
                calls.set(calls.get() + 1);
                **v * 2
            });
        }

        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut ctx = SelectorContext::new();
        let input = Arc::new(0_u32);
        let calls = Cell::new(0);

        for _ in 0..2 {
            let result = ctx.select("fails", Arc::clone(&input), |_| {
                calls.set(calls.get() + 1);
                Err::<u32, _>("boom")
            });
            assert_eq!(result, Err("boom"));
        }

        assert_eq!(calls.get(), 2);
        assert!(!ctx.is_cached("fails"));
    }

    #[test]
    fn failure_leaves_previous_entry_but_does_not_return_it() {
        let mut ctx = SelectorContext::new();
        let good = Arc::new(2_i32);
        let bad = Arc::new(-1_i32);
        let checked = |ctx: &mut SelectorContext, v: &Arc<i32>| {
            ctx.select("checked", Arc::clone(v), |v| {
                if **v < 0 { Err("negative") } else { Ok(**v) }
            })
        };

        let first = checked(&mut ctx, &good).unwrap();
        assert_eq!(checked(&mut ctx, &bad), Err("negative"));
        let again = checked(&mut ctx, &good).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let mut ctx = SelectorContext::new();
        let input = Arc::new(());
        let calls = Cell::new(0);
        let run = |ctx: &mut SelectorContext| {
            ctx.compute("unit", Arc::clone(&input), |_| calls.set(calls.get() + 1));
        };

        run(&mut ctx);
        ctx.invalidate("unit");
        run(&mut ctx);

        assert_eq!(calls.get(), 2);
    }

    struct Numbers {
        values: Arc<Vec<i64>>,
        offset: i64,
    }

    static TOTAL_CALLS: AtomicUsize = AtomicUsize::new(0);

    const TOTAL: Selector<Numbers, (Arc<Vec<i64>>,), i64, Infallible> = Selector::new(
        "total",
        |_, state| Ok((Arc::clone(&state.values),)),
        |(values,)| {
            TOTAL_CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(values.iter().sum())
        },
    );

    const SHIFTED: Selector<Numbers, (Arc<i64>, i64), i64, Infallible> = Selector::new(
        "shifted",
        |ctx, state| Ok((TOTAL.select(ctx, state)?, state.offset)),
        |(total, offset)| Ok(**total + offset),
    );

    #[test]
    fn declared_selectors_chain_and_share_upstream_results() {
        let mut ctx = SelectorContext::new();
        let values = Arc::new(vec![1, 2, 3]);

        let state = Numbers {
            values: Arc::clone(&values),
            offset: 10,
        };
        assert_eq!(*SHIFTED.select(&mut ctx, &state).unwrap(), 16);

        let next = Numbers { values, offset: 20 };
        assert_eq!(*SHIFTED.select(&mut ctx, &next).unwrap(), 26);

        assert_eq!(TOTAL_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.stats(TOTAL.name()).hits, 1);
        assert_eq!(ctx.stats(SHIFTED.name()).misses, 2);
    }
}
