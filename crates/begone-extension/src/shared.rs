//! Access to state shared between JS callbacks.
//!
//! Callbacks only hold weak references, and one callback may fire while another is
//! still running further up the stack.

use std::cell::RefCell;
use std::rc::Weak;

#[derive(Debug, PartialEq)]
pub enum Access<R> {
    Ran(R),
    /// Borrowed by a caller further up the stack.
    Busy,
    /// Owner dropped.
    Gone,
}

impl<R> Access<R> {
    pub fn ran(self) -> Option<R> {
        match self {
            Access::Ran(value) => Some(value),
            Access::Busy | Access::Gone => None,
        }
    }
}

pub fn try_with<T, R>(weak: &Weak<RefCell<T>>, f: impl FnOnce(&mut T) -> R) -> Access<R> {
    let Some(shared) = weak.upgrade() else {
        return Access::Gone;
    };
    let Ok(mut value) = shared.try_borrow_mut() else {
        return Access::Busy;
    };
    Access::Ran(f(&mut value))
}

/// Run `f` now, or hand it to `defer` when the value is busy so it runs after the
/// current borrow ends instead of being dropped.
pub fn run_or_defer<T: 'static>(
    weak: &Weak<RefCell<T>>,
    f: impl FnOnce(&mut T) + 'static,
    defer: impl FnOnce(Box<dyn FnOnce()>),
) {
    let Some(shared) = weak.upgrade() else {
        return;
    };
    match shared.try_borrow_mut() {
        Ok(mut value) => f(&mut value),
        Err(_) => {
            let weak = weak.clone();
            defer(Box::new(move || {
                let _ = try_with(&weak, f);
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn reports_busy_and_gone() {
        let shared = Rc::new(RefCell::new(1));
        let weak = Rc::downgrade(&shared);

        assert_eq!(try_with(&weak, |v| *v + 1), Access::Ran(2));

        let guard = shared.borrow_mut();
        assert_eq!(try_with(&weak, |v| *v), Access::Busy);
        drop(guard);

        drop(shared);
        assert_eq!(try_with(&weak, |v| *v), Access::Gone);
    }

    #[test]
    fn busy_work_is_deferred_not_lost() {
        let shared = Rc::new(RefCell::new(Vec::<&str>::new()));
        let weak = Rc::downgrade(&shared);
        let mut queued: Vec<Box<dyn FnOnce()>> = Vec::new();

        {
            let _outer = shared.borrow_mut();
            run_or_defer(&weak, |log| log.push("released"), |task| queued.push(task));
        }
        assert!(shared.borrow().is_empty());
        assert_eq!(queued.len(), 1);

        for task in queued.drain(..) {
            task();
        }
        assert_eq!(*shared.borrow(), ["released"]);
    }

    #[test]
    fn free_value_runs_immediately() {
        let shared = Rc::new(RefCell::new(0));
        let weak = Rc::downgrade(&shared);
        let mut deferred = 0;

        run_or_defer(&weak, |v| *v += 1, |_| deferred += 1);

        assert_eq!(*shared.borrow(), 1);
        assert_eq!(deferred, 0);
    }
}
