//! Property-based invariant tests for the allocator.
//!
//! For arbitrary task lists, fixed events, buffers and day windows:
//!
//! 1. Blocks never overlap
//! 2. Every block lies inside the day window
//! 3. Placed blocks start at least `buffer` after every earlier block ends
//! 4. Each task's placed plus unplaced minutes equal its normalized duration
//! 5. Identical inputs give identical placements
//! 6. Ranking is idempotent

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dayplan_core::clock::normalize_duration;
use dayplan_core::{
    Allocation, Allocator, Block, BlockKind, DayWindow, Deadline, Priority, RankStrategy,
    SchedulerConfig, Task, TaskRanker,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::High), Just(Priority::Medium), Just(Priority::Low)]
}

fn rank_strategy() -> impl Strategy<Value = RankStrategy> {
    prop_oneof![Just(RankStrategy::DeadlineFirst), Just(RankStrategy::PriorityFirst)]
}

/// (minutes, priority, splittable, deadline day offset, completed)
type TaskSpec = (u32, Priority, bool, Option<u32>, bool);

fn task_spec_strategy() -> impl Strategy<Value = TaskSpec> {
    (
        1u32..300,
        priority_strategy(),
        any::<bool>(),
        proptest::option::of(0u32..5),
        proptest::bool::weighted(0.1),
    )
}

fn build_tasks(specs: &[TaskSpec]) -> Vec<Task> {
    let base = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    specs
        .iter()
        .enumerate()
        .map(|(i, (minutes, priority, splittable, deadline, completed))| {
            let mut task = Task::new(format!("task {i}"), *minutes, *priority)
                .splittable(*splittable)
                .with_created_at(base + Duration::minutes((i % 3) as i64));
            task.id = format!("t{i:03}");
            task.deadline = deadline.map(|d| Deadline::on(day + Duration::days(i64::from(d))));
            task.completed = *completed;
            task
        })
        .collect()
}

/// Fixed events laid end to end with arbitrary gaps, so they never overlap.
fn build_fixed(specs: &[(u32, u32)], from: u32) -> Vec<Block> {
    let mut cursor = from;
    specs
        .iter()
        .enumerate()
        .map(|(i, (gap, len))| {
            let start = cursor + gap * 5;
            let end = start + len * 5;
            cursor = end;
            Block::fixed(format!("ev-{i}"), BlockKind::Calendar, "Event", start, end)
        })
        .collect()
}

fn allocator(start: u32, len: u32, buffer: u32, strategy: RankStrategy) -> Allocator {
    Allocator::with_config(SchedulerConfig {
        window: DayWindow::new(start, start + len).unwrap(),
        buffer_minutes: buffer,
        strategy,
        min_chunk_minutes: 30,
        max_chunk_minutes: 60,
    })
}

fn shape(allocation: &Allocation) -> Vec<(u32, u32, Option<String>, String)> {
    allocation
        .blocks
        .iter()
        .map(|b| (b.start, b.end, b.task_id.clone(), b.title.clone()))
        .collect()
}

proptest! {
    #[test]
    fn blocks_never_overlap_and_stay_in_window(
        day_start in (60u32..120).prop_map(|s| s * 5),
        day_len in (12u32..120).prop_map(|l| l * 5),
        buffer in 0u32..30,
        strategy in rank_strategy(),
        specs in prop::collection::vec(task_spec_strategy(), 0..12),
        fixed in prop::collection::vec((0u32..30, 1u32..18), 0..5),
    ) {
        let tasks = build_tasks(&specs);
        let fixed = build_fixed(&fixed, day_start.saturating_sub(30));
        let alloc = allocator(day_start, day_len, buffer, strategy).allocate(&tasks, &fixed);

        for block in &alloc.blocks {
            prop_assert!(block.start < block.end);
            prop_assert!(block.start >= day_start);
            prop_assert!(block.end <= day_start + day_len);
        }
        for (i, a) in alloc.blocks.iter().enumerate() {
            for b in &alloc.blocks[i + 1..] {
                prop_assert!(!a.overlaps(b.start, b.end), "{} overlaps {}", a, b);
            }
        }
    }

    #[test]
    fn placed_blocks_respect_buffer(
        buffer in 0u32..45,
        specs in prop::collection::vec(task_spec_strategy(), 0..10),
        fixed in prop::collection::vec((0u32..20, 1u32..12), 0..4),
    ) {
        let tasks = build_tasks(&specs);
        let fixed = build_fixed(&fixed, 540);
        let alloc = allocator(540, 480, buffer, RankStrategy::DeadlineFirst).allocate(&tasks, &fixed);

        for placed in alloc.blocks.iter().filter(|b| !b.fixed) {
            for earlier in alloc.blocks.iter().filter(|b| b.start < placed.start) {
                prop_assert!(
                    earlier.end + buffer <= placed.start,
                    "{} is closer than {} minutes after {}", placed, buffer, earlier
                );
            }
        }
    }

    #[test]
    fn minutes_are_conserved(
        buffer in 0u32..20,
        strategy in rank_strategy(),
        specs in prop::collection::vec(task_spec_strategy(), 0..12),
    ) {
        let tasks = build_tasks(&specs);
        let alloc = allocator(540, 360, buffer, strategy).allocate(&tasks, &[]);

        for task in &tasks {
            let placed = alloc.placed_minutes(&task.id);
            let unplaced = alloc.unplaced_minutes(&task.id);
            if task.completed {
                prop_assert_eq!(placed + unplaced, 0);
            } else {
                prop_assert_eq!(placed + unplaced, normalize_duration(task.duration_minutes));
            }
            if !task.splittable {
                let blocks = alloc.blocks.iter().filter(|b| b.task_id.as_deref() == Some(task.id.as_str())).count();
                prop_assert!(blocks <= 1);
            }
        }
    }

    #[test]
    fn allocation_is_deterministic(
        buffer in 0u32..20,
        strategy in rank_strategy(),
        specs in prop::collection::vec(task_spec_strategy(), 0..12),
        fixed in prop::collection::vec((0u32..20, 1u32..12), 0..4),
    ) {
        let tasks = build_tasks(&specs);
        let fixed = build_fixed(&fixed, 540);
        let alloc = allocator(540, 480, buffer, strategy);

        let first = alloc.allocate(&tasks, &fixed);
        let mut reversed = tasks.clone();
        reversed.reverse();
        let second = alloc.allocate(&reversed, &fixed);

        prop_assert_eq!(shape(&first), shape(&second));
        prop_assert_eq!(first.unplaced, second.unplaced);
    }

    #[test]
    fn ranking_is_idempotent(
        strategy in rank_strategy(),
        specs in prop::collection::vec(task_spec_strategy(), 0..16),
    ) {
        let tasks = build_tasks(&specs);
        let ranker = TaskRanker::new(strategy);
        let once: Vec<Task> = ranker.rank(&tasks).into_iter().cloned().collect();
        let twice: Vec<Task> = ranker.rank(&once).into_iter().cloned().collect();

        prop_assert_eq!(&once, &twice);
        prop_assert!(once.iter().all(|t| !t.completed));
    }
}
