//! Instance identifiers.
//!
//! Each component gets a short opaque token at construction, used only
//! to correlate a rendered subtree with its placeholder stub inside a
//! parent's template output. A thread-local monotonic counter is enough:
//! ids never repeat, so they never collide within one render pass.

use std::cell::RefCell;

thread_local! {
    /// Counter for generating unique component ids.
    static ID_COUNTER: RefCell<u64> = const { RefCell::new(0) };
}

/// Generate the next component id (`c0`, `c1`, ...).
pub fn next_id() -> String {
    ID_COUNTER.with(|counter| {
        let mut counter = counter.borrow_mut();
        let id = format!("c{}", *counter);
        *counter += 1;
        id
    })
}

// =============================================================================
// Tests
// =============================================================================
