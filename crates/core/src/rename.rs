use crate::maintainer::PhaseContext;
use crate::proprietary::{convert_resolved, RenameOutcome};
use crate::record::{file_name_lossy, FileRecord, NameClassification};
use anyhow::Result;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct RenamePhase {
    pub records: Vec<FileRecord>,
    pub renamed: usize,
    pub duplicated: usize,
}

impl RenamePhase {
    pub fn duplicates_found(&self) -> bool {
        self.duplicated > 0
    }
}

pub fn run_rename_phase(records: Vec<FileRecord>, ctx: &PhaseContext<'_>) -> Result<RenamePhase> {
    let mut phase = RenamePhase {
        records: Vec::with_capacity(records.len()),
        ..RenamePhase::default()
    };

    for record in records {
        let NameClassification::Proprietary(name) = &record.classification else {
            phase.records.push(record);
            continue;
        };

        match convert_resolved(&record.path, name, ctx.times, &ctx.bounds)? {
            RenameOutcome::Renamed(target) => {
                info!(
                    "[MNT] [Renamed]: {} -> {}",
                    record.path.display(),
                    file_name_lossy(&target)
                );
                phase.renamed += 1;
                phase.records.push(FileRecord::classify(target, &ctx.bounds));
            }
            RenameOutcome::DuplicateSkipped(existing) => {
                warn!(
                    "[MNT] [Duplicated]: {} (既存: {})",
                    record.path.display(),
                    existing.display()
                );
                phase.duplicated += 1;
                phase.records.push(record);
            }
            RenameOutcome::NotApplicable => {
                debug!(
                    "[MNT] [OutOfBounds]: {} (年の範囲 {})",
                    record.path.display(),
                    ctx.bounds
                );
                phase.records.push(record);
            }
        }
    }

    info!(
        "[MNT] <NewResultsBlock> リネーム {}件 / 重複 {}件",
        phase.renamed, phase.duplicated
    );
    Ok(phase)
}
