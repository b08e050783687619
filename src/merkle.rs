//! Merkle commitments over sector regions.
//!
//! Sectors are far larger than RAM, so nothing here materializes a tree.
//! Both the root and the batched authentication paths are computed in one
//! sequential pass over the leaves with an explicit stack of
//! `(item, height)` frames: whenever the two top frames have equal height
//! they fold into their parent, so at most `log2(count) + 1` frames are ever
//! live. Path extraction threads a per-leaf containment flag through each
//! frame and collects siblings as folds happen.
//!
//! Stack-shape violations are programmer errors and abort; a recomputed root
//! that disagrees with a stored one is a fatal integrity error.

use crate::item::SectorItem;
use crate::region::ItemRegion;

/// Compute the root of a perfect Merkle tree over `region`.
///
/// The leaf count must be a power of two ≥ 1. Memory: O(log count).
pub fn mkl_root(region: &ItemRegion<'_>) -> SectorItem {
    let count = region.len();
    assert!(
        count.is_power_of_two(),
        "merkle leaf count {count} is not a power of two"
    );

    let mut stack: Vec<(SectorItem, u32)> = Vec::with_capacity(64);
    let mut offset = 0u64;

    loop {
        if stack.len() >= 2 {
            let (_, right_height) = stack[stack.len() - 1];
            let (_, left_height) = stack[stack.len() - 2];
            if right_height == left_height {
                let (right, _) = stack.pop().expect("stack has two frames");
                let top = stack.last_mut().expect("stack has two frames");
                top.0 = SectorItem::compress(&top.0, &right);
                top.1 += 1;
                continue;
            }
        }

        if offset == count {
            break;
        }

        stack.push((region.get(offset), 0));
        offset += 1;
    }

    assert_eq!(stack.len(), 1, "merkle stack did not fold to a single root");
    let (root, height) = stack[0];
    assert_eq!(
        1u64 << height,
        count,
        "merkle root height {height} does not cover {count} leaves"
    );
    root
}

/// One in-flight subtree during path extraction: its root so far, its
/// height, and which of the requested leaves it contains.
struct PathFrame {
    item: SectorItem,
    height: u32,
    contains: Vec<bool>,
}

/// Extract authentication paths for `positions` in one pass over `region`,
/// asserting that the recomputed root equals `expected_root`.
///
/// Returns one bottom-up path of length `log2(count)` per requested
/// position, in request order. Duplicate positions each receive their own
/// (identical) path. Memory: O(log count · positions.len()).
pub fn mkl_paths(
    region: &ItemRegion<'_>,
    positions: &[u64],
    expected_root: &SectorItem,
) -> Vec<Vec<SectorItem>> {
    let count = region.len();
    assert!(
        count.is_power_of_two(),
        "merkle leaf count {count} is not a power of two"
    );
    for &pos in positions {
        assert!(pos < count, "leaf position {pos} outside region of {count}");
    }

    let mut paths: Vec<Vec<SectorItem>> = vec![Vec::new(); positions.len()];
    let mut stack: Vec<PathFrame> = Vec::with_capacity(64);
    let mut offset = 0u64;

    loop {
        if stack.len() >= 2 && stack[stack.len() - 1].height == stack[stack.len() - 2].height {
            let right = stack.pop().expect("stack has two frames");
            let left = stack.last_mut().expect("stack has two frames");

            for (i, path) in paths.iter_mut().enumerate() {
                if right.contains[i] {
                    path.push(left.item);
                    left.contains[i] = true;
                } else if left.contains[i] {
                    path.push(right.item);
                }
            }

            left.item = SectorItem::compress(&left.item, &right.item);
            left.height += 1;
            continue;
        }

        if offset == count {
            break;
        }

        let item = region.get(offset);
        let contains = positions.iter().map(|&pos| pos == offset).collect();
        stack.push(PathFrame {
            item,
            height: 0,
            contains,
        });
        offset += 1;
    }

    assert_eq!(stack.len(), 1, "merkle stack did not fold to a single root");
    assert_eq!(
        &stack[0].item, expected_root,
        "recomputed merkle root disagrees with the stored root"
    );

    paths
}

/// Fold a bottom-up authentication path and compare against `root`.
///
/// At each level the accumulator is the left input when `pos` is even and
/// the right input when odd; `pos` then shifts to the parent.
pub fn verify_path(leaf: &SectorItem, pos: u64, root: &SectorItem, path: &[SectorItem]) -> bool {
    let mut acc = *leaf;
    let mut pos = pos;
    for sibling in path {
        if pos % 2 == 1 {
            acc = SectorItem::compress(sibling, &acc);
        } else {
            acc = SectorItem::compress(&acc, sibling);
        }
        pos >>= 1;
    }
    &acc == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ITEM_SIZE_BYTES;
    use crate::region::ItemRegionMut;

    fn leaves(count: u64, salt: u64) -> Vec<u8> {
        let mut backing = vec![0u8; count as usize * ITEM_SIZE_BYTES];
        let mut region = ItemRegionMut::new(&mut backing);
        for i in 0..count {
            region.set(i, &SectorItem::from_index(i.wrapping_mul(salt) ^ 0x5a5a));
        }
        backing
    }

    /// Classical bottom-up reference root.
    fn naive_root(region: &ItemRegion<'_>) -> SectorItem {
        let mut layer: Vec<SectorItem> = (0..region.len()).map(|i| region.get(i)).collect();
        while layer.len() > 1 {
            layer = layer
                .chunks_exact(2)
                .map(|pair| SectorItem::compress(&pair[0], &pair[1]))
                .collect();
        }
        layer[0]
    }

    #[test]
    fn test_stack_root_matches_naive_reference() {
        for count in [1u64, 2, 4, 8, 16, 32, 64] {
            let backing = leaves(count, 31 + count);
            let region = ItemRegion::new(&backing);
            assert_eq!(mkl_root(&region), naive_root(&region), "count {count}");
        }
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let backing = leaves(1, 9);
        let region = ItemRegion::new(&backing);
        assert_eq!(mkl_root(&region), region.get(0));
    }

    #[test]
    fn test_every_path_authenticates() {
        let backing = leaves(16, 77);
        let region = ItemRegion::new(&backing);
        let root = mkl_root(&region);

        let positions: Vec<u64> = (0..16).collect();
        let paths = mkl_paths(&region, &positions, &root);
        for (pos, path) in positions.iter().zip(paths.iter()) {
            assert_eq!(path.len(), 4);
            assert!(verify_path(&region.get(*pos), *pos, &root, path));
            // Shifting the leaf one position breaks the fold.
            assert!(!verify_path(&region.get(*pos), pos ^ 1, &root, path));
        }
    }

    #[test]
    fn test_batched_paths_match_single_extraction() {
        let backing = leaves(32, 13);
        let region = ItemRegion::new(&backing);
        let root = mkl_root(&region);

        let batch = mkl_paths(&region, &[3, 17, 30], &root);
        for (i, &pos) in [3u64, 17, 30].iter().enumerate() {
            let single = mkl_paths(&region, &[pos], &root);
            assert_eq!(batch[i], single[0]);
        }
    }

    #[test]
    fn test_duplicate_positions_get_identical_paths() {
        let backing = leaves(8, 5);
        let region = ItemRegion::new(&backing);
        let root = mkl_root(&region);

        let paths = mkl_paths(&region, &[6, 6], &root);
        assert_eq!(paths[0], paths[1]);
        assert!(verify_path(&region.get(6), 6, &root, &paths[0]));
    }

    #[test]
    fn test_path_first_entry_is_sibling() {
        let backing = leaves(8, 21);
        let region = ItemRegion::new(&backing);
        let root = mkl_root(&region);

        let paths = mkl_paths(&region, &[5], &root);
        assert_eq!(paths[0][0], region.get(4));
    }

    #[test]
    #[should_panic]
    fn test_paths_reject_mismatched_root() {
        let backing = leaves(8, 3);
        let region = ItemRegion::new(&backing);
        let wrong = SectorItem::from_index(1234);
        let _ = mkl_paths(&region, &[0], &wrong);
    }
}
