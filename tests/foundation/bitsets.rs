//! Integration tests for packed group bit-sets
//!
//! Every 128-bit and 256-bit pattern must survive packing and unpacking.

use mapstudio_foundation::{BitSet128, BitSet256, BitWidth, ErrorKind};
use proptest::prelude::*;

// =============================================================================
// Widths
// =============================================================================

#[test]
fn widths_match_block_counts() {
    assert_eq!(BitWidth::W128.blocks(), 4);
    assert_eq!(BitWidth::W256.blocks(), 8);
    assert_eq!(BitSet128::WIDTH, 128);
    assert_eq!(BitSet256::WIDTH, 256);
}

#[test]
fn wrong_length_is_a_width_mismatch() {
    let err = BitSet128::from_bools(&[true; 100]).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::BitSetWidthMismatch {
            expected: 128,
            actual: 100
        }
    ));
    assert!(err.is_configuration());

    let err = BitSet256::try_from_slice(&[0; 4]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::BitSetWidthMismatch { .. }));
}

#[test]
fn block_layout_is_little_endian_by_bit() {
    let set = BitSet128::from_enabled([0, 33, 127]).unwrap();
    assert_eq!(set.to_blocks(), [1, 2, 0, 0x8000_0000]);
    assert_eq!(set.enabled(), vec![0, 33, 127]);
    assert_eq!(set.count(), 3);
}

// =============================================================================
// Round Trips
// =============================================================================

proptest! {
    #[test]
    fn unpack_pack_128(blocks in prop::array::uniform4(any::<u32>())) {
        let set = BitSet128::from_blocks(blocks);
        let back = BitSet128::from_bools(&set.to_bools()).unwrap();
        prop_assert_eq!(back.to_blocks(), blocks);
    }

    #[test]
    fn unpack_pack_256(blocks in prop::array::uniform8(any::<u32>())) {
        let set = BitSet256::from_blocks(blocks);
        let back = BitSet256::from_bools(&set.to_bools()).unwrap();
        prop_assert_eq!(back, set);
    }

    #[test]
    fn pack_unpack_bools(bools in prop::collection::vec(any::<bool>(), 256)) {
        let set = BitSet256::from_bools(&bools).unwrap();
        prop_assert_eq!(set.to_bools(), bools);
    }

    #[test]
    fn enabled_indices_round_trip(indices in prop::collection::btree_set(0usize..256, 0..40)) {
        let set = BitSet256::from_enabled(indices.iter().copied()).unwrap();
        prop_assert_eq!(set.enabled(), indices.into_iter().collect::<Vec<_>>());
    }
}
