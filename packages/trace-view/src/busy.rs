//! Scoped busy-overlay handling.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::traits::BaseBusyIndicator;

/// Shows the indicator on acquire and hides it on drop.
///
/// Every exit path (success, error, early return, a dropped future) releases
/// exactly once.
#[must_use = "the indicator is hidden as soon as the guard is dropped"]
pub struct BusyGuard {
    indicator: Arc<dyn BaseBusyIndicator>,
}

impl BusyGuard {
    pub fn acquire(indicator: &Arc<dyn BaseBusyIndicator>) -> Self {
        indicator.show();
        Self {
            indicator: Arc::clone(indicator),
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}

/// Makes any indicator reentrant: only the outermost show/hide pair reaches
/// the wrapped indicator.
pub struct CountingBusyIndicator<I> {
    inner: I,
    depth: AtomicUsize,
}

impl<I: BaseBusyIndicator> CountingBusyIndicator<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            depth: AtomicUsize::new(0),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl<I: BaseBusyIndicator> BaseBusyIndicator for CountingBusyIndicator<I> {
    fn show(&self) {
        if self.depth.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.show();
        }
    }

    fn hide(&self) {
        match self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |d| d.checked_sub(1))
        {
            Ok(1) => self.inner.hide(),
            Ok(_) => {}
            Err(_) => warn!("busy indicator hidden without a matching show"),
        }
    }
}

impl<I: BaseBusyIndicator + ?Sized> BaseBusyIndicator for Arc<I> {
    fn show(&self) {
        (**self).show()
    }

    fn hide(&self) {
        (**self).hide()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_dependencies::MockBusyIndicator;

    #[test]
    fn guard_pairs_show_and_hide() {
        let mock = Arc::new(MockBusyIndicator::new());
        let indicator: Arc<dyn BaseBusyIndicator> = mock.clone();
        {
            let _guard = BusyGuard::acquire(&indicator);
            assert_eq!(mock.shows(), 1);
            assert_eq!(mock.hides(), 0);
        }
        assert_eq!(mock.hides(), 1);
    }

    #[test]
    fn guard_releases_on_early_return() {
        fn guarded(indicator: &Arc<dyn BaseBusyIndicator>, fail: bool) -> Result<(), &'static str> {
            let _guard = BusyGuard::acquire(indicator);
            if fail {
                return Err("boom");
            }
            Ok(())
        }

        let mock = Arc::new(MockBusyIndicator::new());
        let indicator: Arc<dyn BaseBusyIndicator> = mock.clone();
        assert!(guarded(&indicator, true).is_err());
        assert_eq!(mock.shows(), 1);
        assert_eq!(mock.hides(), 1);
    }

    #[test]
    fn nested_shows_only_hide_at_outermost() {
        let mock = Arc::new(MockBusyIndicator::new());
        let counting = CountingBusyIndicator::new(mock.clone());

        counting.show();
        counting.show();
        counting.hide();
        assert!(mock.is_visible());
        assert_eq!(counting.depth(), 1);

        counting.hide();
        assert!(!mock.is_visible());
        assert_eq!(mock.shows(), 1);
        assert_eq!(mock.hides(), 1);
    }

    #[test]
    fn unmatched_hide_is_ignored() {
        let mock = Arc::new(MockBusyIndicator::new());
        let counting = CountingBusyIndicator::new(mock.clone());
        counting.hide();
        assert_eq!(mock.hides(), 0);
        assert_eq!(counting.depth(), 0);
    }
}
