//! Identity comparison for selector inputs.
//!
//! Selectors memoize on input *identity*, not structural equality. Shared
//! collections are passed as [`Arc`]s and compared with [`Arc::ptr_eq`], so
//! two snapshots holding the same allocation hit the cache while a freshly
//! built (even if equal) collection does not. Small `Copy` scalars such as the
//! selected week have no meaningful identity and compare by value.

use std::sync::Arc;

use chrono::NaiveDate;

/// A value that can be recorded as a selector input and compared against the
/// inputs of the previous invocation.
pub trait SelectorInput: 'static {
    /// Returns `true` if `other` is the same input as `self`.
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized + 'static> SelectorInput for Arc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<I: SelectorInput> SelectorInput for Option<I> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl SelectorInput for () {
    fn same_as(&self, _other: &Self) -> bool {
        true
    }
}

macro_rules! value_input {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SelectorInput for $ty {
                fn same_as(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

value_input!(
    bool,
    u8,
    u16,
    u32,
    u64,
    usize,
    i32,
    i64,
    String,
    &'static str,
    NaiveDate,
);

macro_rules! tuple_input {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: SelectorInput),+> SelectorInput for ($($name,)+) {
            fn same_as(&self, other: &Self) -> bool {
                $(self.$idx.same_as(&other.$idx))&&+
            }
        }
    };
}

tuple_input!(A: 0);
tuple_input!(A: 0, B: 1);
tuple_input!(A: 0, B: 1, C: 2);
tuple_input!(A: 0, B: 1, C: 2, D: 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arcs_compare_by_pointer() {
        let a = Arc::new(vec![1, 2, 3]);
        let b = Arc::new(vec![1, 2, 3]);
        assert!(a.same_as(&Arc::clone(&a)));
        assert!(!a.same_as(&b));
    }

    #[test]
    fn tuples_require_every_member_identical() {
        let a = Arc::new(1);
        let b = Arc::new(2);
        let week = NaiveDate::from_ymd_opt(2020, 3, 7).unwrap();

        let first = (Arc::clone(&a), Arc::clone(&b), week);
        let same = (Arc::clone(&a), Arc::clone(&b), week);
        let other_week = (a, b, week.succ_opt().unwrap());

        assert!(first.same_as(&same));
        assert!(!first.same_as(&other_week));
    }

    #[test]
    fn options_compare_inner_identity() {
        let a = Arc::new("x");
        assert!(Some(Arc::clone(&a)).same_as(&Some(Arc::clone(&a))));
        assert!(!Some(a).same_as(&None));
        assert!(None::<Arc<u8>>.same_as(&None));
    }
}
