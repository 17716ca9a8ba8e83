use crate::convention::decode;
use crate::maintainer::PhaseContext;
use crate::record::FileRecord;
use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDecision {
    Update(NaiveDateTime),
    Unchanged,
}

pub fn decide(current: NaiveDateTime, decoded: NaiveDateTime, newest_only: bool) -> SyncDecision {
    let outdated = if newest_only {
        current > decoded
    } else {
        current != decoded
    };
    if outdated {
        SyncDecision::Update(decoded)
    } else {
        SyncDecision::Unchanged
    }
}

pub fn run_sync_phase(records: &[FileRecord], ctx: &PhaseContext<'_>) -> Result<usize> {
    let mut updated = 0usize;
    for record in records.iter().filter(|r| r.classification.is_canonical()) {
        let decoded = decode(record.file_name(), &ctx.bounds)?.to_naive_datetime();
        let decoded = ctx.times.representable(decoded);
        let current = ctx.times.modify_time(&record.path)?;
        if let SyncDecision::Update(target) = decide(current, decoded, ctx.newest_only) {
            ctx.times.set_modify_time(&record.path, target)?;
            info!("[MNT] [DateUpdated]: {}", record.path.display());
            updated += 1;
        }
    }

    info!("[MNT] <NewResultsBlock> 更新日時を修正: {}件", updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::{decide, run_sync_phase, SyncDecision};
    use crate::convention::YearBounds;
    use crate::maintainer::PhaseContext;
    use crate::os_date::ModifyTimes;
    use crate::record::FileRecord;
    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("datetime")
    }

    #[derive(Default)]
    struct MemoryTimes {
        times: RefCell<HashMap<PathBuf, NaiveDateTime>>,
        writes: RefCell<usize>,
    }

    impl ModifyTimes for MemoryTimes {
        fn modify_time(&self, path: &Path) -> Result<NaiveDateTime> {
            self.times
                .borrow()
                .get(path)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing: {}", path.display()))
        }

        fn set_modify_time(&self, path: &Path, time: NaiveDateTime) -> Result<()> {
            self.times.borrow_mut().insert(path.to_path_buf(), time);
            *self.writes.borrow_mut() += 1;
            Ok(())
        }
    }

    // A clock where 2021-03-28 02:00..03:00 does not exist and writes there
    // land one hour later.
    #[derive(Default)]
    struct GapTimes(MemoryTimes);

    impl ModifyTimes for GapTimes {
        fn modify_time(&self, path: &Path) -> Result<NaiveDateTime> {
            self.0.modify_time(path)
        }

        fn set_modify_time(&self, path: &Path, time: NaiveDateTime) -> Result<()> {
            self.0.set_modify_time(path, self.representable(time))
        }

        fn representable(&self, time: NaiveDateTime) -> NaiveDateTime {
            let gap = at(2021, 3, 28, 2)..at(2021, 3, 28, 3);
            if gap.contains(&time) {
                time + TimeDelta::hours(1)
            } else {
                time
            }
        }
    }

    #[test]
    fn newest_only_pulls_back_but_never_forward() {
        let name = at(2021, 6, 15, 14);
        assert_eq!(
            decide(at(2021, 7, 1, 0), name, true),
            SyncDecision::Update(name)
        );
        assert_eq!(decide(at(2021, 6, 1, 0), name, true), SyncDecision::Unchanged);
    }

    #[test]
    fn exact_mode_updates_any_mismatch() {
        let name = at(2021, 6, 15, 14);
        assert_eq!(
            decide(at(2021, 6, 1, 0), name, false),
            SyncDecision::Update(name)
        );
        assert_eq!(
            decide(at(2021, 7, 1, 0), name, false),
            SyncDecision::Update(name)
        );
    }

    #[test]
    fn equal_times_are_unchanged_in_both_modes() {
        let name = at(2021, 6, 15, 14);
        assert_eq!(decide(name, name, true), SyncDecision::Unchanged);
        assert_eq!(decide(name, name, false), SyncDecision::Unchanged);
    }

    #[test]
    fn only_canonical_records_are_touched_and_second_pass_is_a_no_op() {
        let bounds = YearBounds::default();
        let canonical = PathBuf::from("/m/20210615_140000_IMG.jpg");
        let date_only = PathBuf::from("/m/20210615_party.jpg");
        let proprietary = PathBuf::from("/m/IMG_20210615_140000.jpg");
        let times = MemoryTimes::default();
        for path in [&canonical, &date_only, &proprietary] {
            times.times.borrow_mut().insert(path.clone(), at(2022, 1, 1, 0));
        }

        let records: Vec<FileRecord> = [&canonical, &date_only, &proprietary]
            .into_iter()
            .map(|p| FileRecord::classify(p.clone(), &bounds))
            .collect();
        let ctx = PhaseContext {
            bounds,
            newest_only: true,
            times: &times,
        };

        assert_eq!(run_sync_phase(&records, &ctx).expect("first pass"), 2);
        assert_eq!(times.modify_time(&canonical).expect("t"), at(2021, 6, 15, 14));
        assert_eq!(times.modify_time(&date_only).expect("t"), at(2021, 6, 15, 0));
        assert_eq!(times.modify_time(&proprietary).expect("t"), at(2022, 1, 1, 0));

        assert_eq!(run_sync_phase(&records, &ctx).expect("second pass"), 0);
        assert_eq!(*times.writes.borrow(), 2);
    }

    #[test]
    fn read_failure_is_propagated() {
        let bounds = YearBounds::default();
        let records = vec![FileRecord::classify(
            PathBuf::from("/m/20210615_140000.jpg"),
            &bounds,
        )];
        let times = MemoryTimes::default();
        let ctx = PhaseContext {
            bounds,
            newest_only: false,
            times: &times,
        };
        assert!(run_sync_phase(&records, &ctx).is_err());
    }

    #[test]
    fn name_inside_a_dst_gap_converges_after_one_update() {
        let bounds = YearBounds::default();
        let path = PathBuf::from("/m/20210328_023000.jpg");
        let records = vec![FileRecord::classify(path.clone(), &bounds)];
        let landed = at(2021, 3, 28, 3) + TimeDelta::minutes(30);

        for (newest_only, staged) in [(true, at(2021, 4, 1, 0)), (false, at(2021, 3, 1, 0))] {
            let times = GapTimes::default();
            times.0.times.borrow_mut().insert(path.clone(), staged);
            let ctx = PhaseContext {
                bounds,
                newest_only,
                times: &times,
            };

            let updates: Vec<usize> = (0..3)
                .map(|_| run_sync_phase(&records, &ctx).expect("sync pass"))
                .collect();
            assert_eq!(updates, vec![1, 0, 0], "newest_only={newest_only}");
            assert_eq!(times.modify_time(&path).expect("t"), landed);
            assert_eq!(*times.0.writes.borrow(), 1);
        }
    }
}
