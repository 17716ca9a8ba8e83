use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

pub trait ModifyTimes {
    fn modify_time(&self, path: &Path) -> Result<NaiveDateTime>;
    fn set_modify_time(&self, path: &Path, time: NaiveDateTime) -> Result<()>;

    fn representable(&self, time: NaiveDateTime) -> NaiveDateTime {
        time
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsModifyTimes;

impl ModifyTimes for OsModifyTimes {
    fn modify_time(&self, path: &Path) -> Result<NaiveDateTime> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("更新日時を読めませんでした: {}", path.display()))?;
        Ok(system_time_to_local(modified))
    }

    fn set_modify_time(&self, path: &Path, time: NaiveDateTime) -> Result<()> {
        let target = FileTime::from_system_time(local_to_system_time(time));
        filetime::set_file_mtime(path, target)
            .with_context(|| format!("更新日時を書き込めませんでした: {}", path.display()))
    }

    fn representable(&self, time: NaiveDateTime) -> NaiveDateTime {
        system_time_to_local(local_to_system_time(time))
    }
}

pub fn system_time_to_local(time: SystemTime) -> NaiveDateTime {
    let local: DateTime<Local> = DateTime::from(time);
    let naive = local.naive_local();
    naive.with_nanosecond(0).unwrap_or(naive)
}

// Ambiguous times take the earlier instant. Times inside a DST gap keep the
// offset from before the gap, so 02:30 in a one-hour gap lands on 03:30.
pub fn local_to_system_time(time: NaiveDateTime) -> SystemTime {
    let instant = match Local.from_local_datetime(&time).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let before = Local.offset_from_utc_datetime(&(time - TimeDelta::days(1)));
            let utc = time - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    };
    SystemTime::from(instant)
}
