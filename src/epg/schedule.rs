//! Per-channel schedule index
//!
//! Programs are grouped by EPG channel id and kept in start order, ties in
//! input order. The index is immutable once built; a new guide load builds a
//! new one.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone};

use crate::models::Program;

#[derive(Debug, Clone, Default)]
pub struct ScheduleIndex {
    programs: HashMap<String, Vec<Program>>,
}

impl ScheduleIndex {
    pub fn build(programs: impl IntoIterator<Item = Program>) -> Self {
        let mut grouped: HashMap<String, Vec<Program>> = HashMap::new();
        for program in programs {
            grouped.entry(program.epg_id.clone()).or_default().push(program);
        }
        // Stable sort keeps input order for equal starts
        for list in grouped.values_mut() {
            list.sort_by_key(|p| p.start);
        }
        Self { programs: grouped }
    }

    /// All programs for a channel, start-ascending
    pub fn programs_for(&self, epg_id: &str) -> &[Program] {
        self.programs.get(epg_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// First program (start order) with `start <= now <= end`
    pub fn current_program<Tz: TimeZone>(&self, epg_id: &str, now: &DateTime<Tz>) -> Option<&Program> {
        let programs = self.programs.get(epg_id)?;
        let started = programs.partition_point(|p| p.start <= *now);
        programs[..started].iter().find(|p| p.is_airing_at(now))
    }

    /// Earliest program with `start > now`
    pub fn next_program<Tz: TimeZone>(&self, epg_id: &str, now: &DateTime<Tz>) -> Option<&Program> {
        let programs = self.programs.get(epg_id)?;
        let idx = programs.partition_point(|p| p.start <= *now);
        programs.get(idx)
    }

    /// Programs overlapping `[from, to)`
    pub fn programs_in_range<Tz: TimeZone>(
        &self,
        epg_id: &str,
        from: &DateTime<Tz>,
        to: &DateTime<Tz>,
    ) -> Vec<&Program> {
        self.programs_for(epg_id)
            .iter()
            .filter(|p| p.end > *from && p.start < *to)
            .collect()
    }

    /// Total number of programs
    pub fn program_count(&self) -> usize {
        self.programs.values().map(Vec::len).sum()
    }

    pub fn channel_count(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl FromIterator<Program> for ScheduleIndex {
    fn from_iter<I: IntoIterator<Item = Program>>(iter: I) -> Self {
        Self::build(iter)
    }
}
