mod config;
mod convention;
mod maintainer;
mod os_date;
mod proprietary;
mod record;
mod rename;
mod scan;
mod sync;

pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use convention::{decode, is_canonical, ConventionError, NameDate, YearBounds};
pub use maintainer::{
    FileMaintainer, MaintenanceOptions, OperatorPrompt, PhaseContext, RunPhase, RunReport,
    SilentPrompt,
};
pub use os_date::{local_to_system_time, system_time_to_local, ModifyTimes, OsModifyTimes};
pub use proprietary::{
    canonical_name_for, convert, convert_resolved, detect, is_proprietary, resolve_date,
    ProprietaryName, RenameOutcome, Signature, SIGNATURE_PRIORITY,
};
pub use record::{FileRecord, NameClassification};
pub use rename::{run_rename_phase, RenamePhase};
pub use scan::{TreeScanner, WalkTreeScanner};
pub use sync::{decide, run_sync_phase, SyncDecision};
