//! Property-based tests for partition correctness
//!
//! Uses proptest to verify the simulator's invariants hold across many random
//! operation sequences

use partition_sim::{select_strategy, Simulator};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Allocate(u64),
    /// Free the n-th used block (modulo the number of used blocks)
    Free(usize),
    Compact,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1u64..400).prop_map(Op::Allocate),
        3 => any::<usize>().prop_map(Op::Free),
        1 => Just(Op::Compact),
    ]
}

/// Operations that never reach the buddy allocator
///
/// Buddy halving is the one operation allowed to leave free blocks side by
/// side, so coalescing properties are checked on fit and paging workloads.
fn fit_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1u64..400)
            .prop_filter("buddy size", |size| !size.is_power_of_two())
            .prop_map(Op::Allocate),
        3 => any::<usize>().prop_map(Op::Free),
        1 => Just(Op::Compact),
    ]
}

fn single_block_size() -> impl Strategy<Value = u64> {
    (1u64..400).prop_filter("buddy or paging size", |size| {
        !size.is_power_of_two() && size % 64 != 0
    })
}

fn apply(sim: &mut Simulator, op: &Op) {
    match op {
        Op::Allocate(size) => {
            let _ = sim.allocate(*size);
        }
        Op::Free(n) => {
            let used: Vec<u64> = sim
                .dump_blocks()
                .iter()
                .filter(|b| !b.free)
                .map(|b| b.start)
                .collect();
            if !used.is_empty() {
                sim.deallocate(used[n % used.len()]).unwrap();
            }
        }
        Op::Compact => {
            sim.compact();
        }
    }
}

proptest! {
    #[test]
    fn prop_blocks_always_tile_the_space(ops in prop::collection::vec(op(), 1..60)) {
        let mut sim = Simulator::new();

        for op in &ops {
            apply(&mut sim, op);

            prop_assert!(sim.validate().is_ok(), "tiling broken after {:?}", op);
            let total: u64 = sim.dump_blocks().iter().map(|b| b.size).sum();
            prop_assert_eq!(total, 1024);
        }
    }

    #[test]
    fn prop_freed_block_has_no_free_neighbors(
        ops in prop::collection::vec(fit_op(), 1..40),
        pick in any::<usize>()
    ) {
        let mut sim = Simulator::new();
        for op in &ops {
            apply(&mut sim, op);
            prop_assert_eq!(sim.partition().adjacent_free_pairs(), 0);
        }

        let blocks = sim.dump_blocks();
        let used: Vec<u64> = blocks.iter().filter(|b| !b.free).map(|b| b.start).collect();
        prop_assume!(!used.is_empty());

        let freed = sim.deallocate(used[pick % used.len()]).unwrap();
        let blocks = sim.dump_blocks();
        let index = blocks.iter().position(|b| b.start == freed.start).unwrap();

        prop_assert!(blocks[index].free);
        if index > 0 {
            prop_assert!(!blocks[index - 1].free);
        }
        if index + 1 < blocks.len() {
            prop_assert!(!blocks[index + 1].free);
        }
    }

    #[test]
    fn prop_allocate_then_free_round_trip(
        ops in prop::collection::vec(fit_op(), 0..40),
        size in single_block_size()
    ) {
        let mut sim = Simulator::new();
        for op in &ops {
            apply(&mut sim, op);
        }
        let before = sim.dump_blocks();

        if let Ok(allocation) = sim.allocate(size) {
            prop_assert_eq!(allocation.extents.len(), 1);
            sim.deallocate(allocation.start().unwrap()).unwrap();
            prop_assert_eq!(sim.dump_blocks(), before);
        } else {
            prop_assert_eq!(sim.dump_blocks(), before);
        }
    }

    #[test]
    fn prop_compaction_is_idempotent(ops in prop::collection::vec(op(), 1..40)) {
        let mut sim = Simulator::new();
        for op in &ops {
            apply(&mut sim, op);
        }

        sim.compact();
        let once = sim.dump_blocks();
        sim.compact();
        prop_assert_eq!(sim.dump_blocks(), once.clone());

        // At most one free block, and it is the tail
        let free: Vec<_> = once.iter().filter(|b| b.free).collect();
        prop_assert!(free.len() <= 1);
        if let Some(tail) = free.first() {
            prop_assert_eq!(tail.start + tail.size, 1024);
        }
    }

    #[test]
    fn prop_dispatch_is_deterministic(
        ops in prop::collection::vec(op(), 0..30),
        size in 1u64..600
    ) {
        let mut sim = Simulator::new();
        for op in &ops {
            apply(&mut sim, op);
        }
        let mut twin = sim.clone();

        prop_assert_eq!(sim.select_strategy(size), select_strategy(size, 64));

        let a = sim.allocate(size);
        let b = twin.allocate(size);
        match (a, b) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.strategy, b.strategy);
                prop_assert_eq!(a.extents, b.extents);
                prop_assert_eq!(a.steps, b.steps);
            }
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "diverged: {:?} vs {:?}", a, b),
        }
        prop_assert_eq!(sim.dump_blocks(), twin.dump_blocks());
    }

    #[test]
    fn prop_fragmentation_accounts_for_all_space(ops in prop::collection::vec(op(), 1..40)) {
        let mut sim = Simulator::new();
        for op in &ops {
            apply(&mut sim, op);
        }

        let report = sim.fragmentation_report();
        let used: u64 = sim
            .dump_blocks()
            .iter()
            .filter(|b| !b.free)
            .map(|b| b.size)
            .sum();

        prop_assert_eq!(report.external + used, 1024);
        prop_assert!(report.largest_free <= report.external);
        prop_assert!(report.internal <= used);
    }
}
