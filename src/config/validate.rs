// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SchedulerError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.logging))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler_section(cfg)?;
    Ok(())
}

fn validate_scheduler_section(cfg: &RawConfigFile) -> Result<()> {
    // stall_policy and logging.level are strongly typed and validated during
    // deserialization.
    if cfg.scheduler.max_parallel_tasks == 0 {
        return Err(SchedulerError::ConfigError(
            "[scheduler].max_parallel_tasks must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
