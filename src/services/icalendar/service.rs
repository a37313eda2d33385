use super::{export, import};
use crate::models::schedule::Schedule;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Service for importing and exporting iCalendar (.ics) files
#[derive(Debug, Default)]
pub struct ICalendarService;

impl ICalendarService {
    pub fn new() -> Self {
        Self
    }

    /// Export schedules as one VCALENDAR
    pub fn export_schedules(&self, schedules: &[Schedule]) -> String {
        export::multiple(schedules)
    }

    /// Parse every VEVENT into a schedule filed under `type_id`
    pub fn import_schedules(&self, ics_content: &str, type_id: i64) -> Result<Vec<Schedule>> {
        import::from_str(ics_content, type_id)
    }

    /// Import schedules from a .ics file on disk
    pub fn import_from_file(&self, path: &Path, type_id: i64) -> Result<Vec<Schedule>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read .ics file: {:?}", path))?;
        self.import_schedules(&content, type_id)
    }

    /// Export schedules to a .ics file on disk
    pub fn export_to_file(&self, schedules: &[Schedule], path: &Path) -> Result<()> {
        let content = self.export_schedules(schedules);
        fs::write(path, content).with_context(|| format!("Failed to write .ics file: {:?}", path))?;
        log::info!("Exported {} schedule(s) to {:?}", schedules.len(), path);
        Ok(())
    }
}
