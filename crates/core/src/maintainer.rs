use crate::config::AppConfig;
use crate::convention::YearBounds;
use crate::os_date::{ModifyTimes, OsModifyTimes};
use crate::record::FileRecord;
use crate::rename::run_rename_phase;
use crate::scan::{TreeScanner, WalkTreeScanner};
use crate::sync::run_sync_phase;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceOptions {
    pub base_path: PathBuf,
    pub folder_patterns: Vec<String>,
    pub year_bounds: YearBounds,
    pub newest_only: bool,
    pub rename_proprietary: bool,
}

impl MaintenanceOptions {
    pub fn from_config(base_path: PathBuf, config: &AppConfig) -> Self {
        Self {
            base_path,
            folder_patterns: config.folder_patterns.clone(),
            year_bounds: config.year_bounds,
            newest_only: config.newest_only,
            rename_proprietary: config.rename_proprietary,
        }
    }
}

impl Default for MaintenanceOptions {
    fn default() -> Self {
        Self::from_config(PathBuf::new(), &AppConfig::default())
    }
}

pub struct PhaseContext<'a> {
    pub bounds: YearBounds,
    pub newest_only: bool,
    pub times: &'a dyn ModifyTimes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Scanned,
    Renamed,
    Synced,
    Reported,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Scanned => "Scanned",
            Self::Renamed => "Renamed",
            Self::Synced => "Synced",
            Self::Reported => "Reported",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub scanned: usize,
    pub renamed: usize,
    pub duplicated: usize,
    pub updated: usize,
    pub duplicates_found: bool,
}

pub trait OperatorPrompt {
    fn acknowledge_duplicates(&mut self, report: &RunReport) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPrompt;

impl OperatorPrompt for SilentPrompt {
    fn acknowledge_duplicates(&mut self, _report: &RunReport) -> Result<()> {
        Ok(())
    }
}

pub struct FileMaintainer<S = WalkTreeScanner, T = OsModifyTimes> {
    options: MaintenanceOptions,
    scanner: S,
    times: T,
}

impl FileMaintainer {
    pub fn new(options: MaintenanceOptions) -> Self {
        Self {
            options,
            scanner: WalkTreeScanner,
            times: OsModifyTimes,
        }
    }
}

impl<S: TreeScanner, T: ModifyTimes> FileMaintainer<S, T> {
    pub fn with_collaborators(options: MaintenanceOptions, scanner: S, times: T) -> Self {
        Self {
            options,
            scanner,
            times,
        }
    }

    pub fn options(&self) -> &MaintenanceOptions {
        &self.options
    }

    pub fn run(&self, embedded: bool, prompt: &mut dyn OperatorPrompt) -> Result<RunReport> {
        let report = self.execute()?;
        if report.duplicates_found && !embedded {
            prompt.acknowledge_duplicates(&report)?;
        }
        Ok(report)
    }

    pub fn execute(&self) -> Result<RunReport> {
        let options = &self.options;
        info!("[MNT] <INIT> FileMaintainer initialized ...");
        info!("[MNT] <CNFG> base_path2scan = {}", options.base_path.display());
        info!("[MNT] <CNFG> fld_patterns = {:?}", options.folder_patterns);
        info!("[MNT] <CNFG> year_bounds = {}", options.year_bounds);
        info!("[MNT] <CNFG> newest_only = {}", options.newest_only);
        info!("[MNT] <CNFG> rename_proprietary = {}", options.rename_proprietary);
        info!("[MNT] <TAGS> [Renamed] [Duplicated] [DateUpdated]");

        let ctx = PhaseContext {
            bounds: options.year_bounds,
            newest_only: options.newest_only,
            times: &self.times,
        };
        let mut report = RunReport::default();

        info!("[MNT] <NewModulePhase> Scanning files in path...");
        let scanned: Vec<FileRecord> = self
            .scanner
            .scan(&options.base_path, &options.folder_patterns)?
            .into_iter()
            .map(|path| FileRecord::classify(path, &options.year_bounds))
            .collect();
        report.scanned = scanned.len();
        enter(RunPhase::Scanned);

        let records = if options.rename_proprietary {
            info!("[MNT] <NewModulePhase> Renaming proprietary file names...");
            let phase = run_rename_phase(scanned, &ctx)?;
            report.renamed = phase.renamed;
            report.duplicated = phase.duplicated;
            report.duplicates_found = phase.duplicates_found();
            enter(RunPhase::Renamed);
            phase.records
        } else {
            scanned
        };

        info!("[MNT] <NewModulePhase> Updating files with date-in-name...");
        report.updated = run_sync_phase(&records, &ctx)?;
        enter(RunPhase::Synced);

        info!(
            "[MNT] <NewResultsBlock> scanned={} renamed={} duplicated={} updated={}",
            report.scanned, report.renamed, report.duplicated, report.updated
        );
        if report.duplicates_found {
            warn!(
                "[MNT] 重複ファイルが {}件 見つかりました。元ファイルはそのまま残しています",
                report.duplicated
            );
        }
        enter(RunPhase::Reported);
        Ok(report)
    }
}

fn enter(phase: RunPhase) {
    info!("[MNT] <Phase> {}", phase);
}
