//! Sequential sector fill.
//!
//! The data region is derived leaf by leaf: each item hashes the identity
//! prefix with its structural parent (the immediate predecessor) and a
//! pseudo-random ancestor chosen by folding the predecessor's words. The
//! chain means leaf `n` cannot be produced without leaf `n-1`, so the pass
//! is strictly serial.

use tracing::debug_span;

use crate::config::FILL_PROGRESS_INTERVAL;
use crate::item::{derive_item, initial_item, SectorItem};
use crate::region::ItemRegionMut;

/// Callback invoked with completion percent and a short description.
pub type ProgressFn<'a> = dyn Fn(u32, &str) + 'a;

/// Fill `region` with the chained derivation for the given identity prefix.
///
/// The region length determines the leaf count. Progress is reported by
/// absolute leaf index, throttled to every [`FILL_PROGRESS_INTERVAL`] leaves.
pub fn build_data(region: &mut ItemRegionMut<'_>, prefix: &SectorItem, progress: &ProgressFn) {
    let count = region.len();
    let _span = debug_span!("build_data", leaves = count).entered();

    region.set(0, &initial_item(prefix));

    for n in 1..count {
        let source = region.get(n - 1);
        let x = SectorItem::parent_x(n);
        let y = source.parent_y(n);

        // x(n) = n-1, so dx is the source itself; dy is a random-access load.
        let dx = region.get(x);
        let dy = region.get(y);
        debug_assert_eq!(dx, source);
        region.set(n, &derive_item(prefix, n, &dx, &dy));

        if n % FILL_PROGRESS_INTERVAL == 0 {
            progress(
                (n * 100 / count) as u32,
                &format!("init data: {n}"),
            );
        }
    }
}
