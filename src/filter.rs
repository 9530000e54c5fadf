use crate::domain::{CommandEntry, ShellKind};
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePreset {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl DatePreset {
    pub const ALL: [DatePreset; 6] = [
        DatePreset::Today,
        DatePreset::Yesterday,
        DatePreset::ThisWeek,
        DatePreset::LastWeek,
        DatePreset::ThisMonth,
        DatePreset::LastMonth,
    ];

    pub fn next(self) -> Self {
        match self {
            DatePreset::Today => DatePreset::Yesterday,
            DatePreset::Yesterday => DatePreset::ThisWeek,
            DatePreset::ThisWeek => DatePreset::LastWeek,
            DatePreset::LastWeek => DatePreset::ThisMonth,
            DatePreset::ThisMonth => DatePreset::LastMonth,
            DatePreset::LastMonth => DatePreset::Today,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DatePreset::Today => "today",
            DatePreset::Yesterday => "yesterday",
            DatePreset::ThisWeek => "this week",
            DatePreset::LastWeek => "last week",
            DatePreset::ThisMonth => "this month",
            DatePreset::LastMonth => "last month",
        }
    }

    pub fn from_digit(digit: char) -> Option<Self> {
        let index = digit.to_digit(10)?.checked_sub(1)?;
        Self::ALL.get(index as usize).copied()
    }

    /// Half-open `[start, end)` window of this preset relative to `now`.
    ///
    /// Weeks start on Monday; a Sunday belongs to the week that began six
    /// days earlier. Boundaries are local calendar midnights, so a window
    /// spanning a DST change is an hour shorter or longer than its nominal
    /// length.
    pub fn resolve<Tz: TimeZone>(self, now: &DateTime<Tz>) -> (DateTime<Tz>, DateTime<Tz>) {
        let today = now.date_naive();
        let monday = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        let first_of_month = today - Days::new(u64::from(today.day0()));

        let (start, end) = match self {
            DatePreset::Today => (today, today + Days::new(1)),
            DatePreset::Yesterday => (today - Days::new(1), today),
            DatePreset::ThisWeek => (monday, monday + Days::new(7)),
            DatePreset::LastWeek => (monday - Days::new(7), monday),
            DatePreset::ThisMonth => (first_of_month, first_of_month + Months::new(1)),
            DatePreset::LastMonth => (first_of_month - Months::new(1), first_of_month),
        };

        let tz = now.timezone();
        (start_of_day(&tz, start), start_of_day(&tz, end))
    }
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateFilter {
    pub enabled: bool,
    pub preset: DatePreset,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
}

impl DateFilter {
    pub fn resolved(preset: DatePreset, now: DateTime<Local>) -> Self {
        let (start, end) = preset.resolve(&now);
        Self {
            enabled: true,
            preset,
            start: Some(start),
            end: Some(end - TimeDelta::nanoseconds(1)),
        }
    }

    pub fn contains(&self, timestamp: &DateTime<Local>) -> bool {
        if !self.enabled {
            return true;
        }
        let after_start = self.start.as_ref().is_none_or(|start| timestamp >= start);
        let before_end = self.end.as_ref().is_none_or(|end| timestamp <= end);
        after_start && before_end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    query: String,
    shell: ShellKind,
    date: DateFilter,
}

impl FilterState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn shell(&self) -> ShellKind {
        self.shell
    }

    pub fn date(&self) -> &DateFilter {
        &self.date
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.shell != ShellKind::Unknown || self.date.enabled
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_shell(&mut self, shell: ShellKind) {
        self.shell = shell;
    }

    pub fn cycle_shell(&mut self) {
        self.shell = self.shell.next();
    }

    pub fn enable_date(&mut self, now: DateTime<Local>) {
        self.date = DateFilter::resolved(DatePreset::Today, now);
    }

    pub fn disable_date(&mut self) {
        self.clear();
    }

    pub fn select_date_preset(&mut self, preset: DatePreset, now: DateTime<Local>) {
        self.date = DateFilter::resolved(preset, now);
    }

    pub fn cycle_date_preset(&mut self, now: DateTime<Local>) {
        let next = self.date.preset.next();
        self.select_date_preset(next, now);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn matches(&self, entry: &CommandEntry) -> bool {
        let query = self.query.to_lowercase();
        let text_ok = query.is_empty() || entry.command.to_lowercase().contains(&query);
        let shell_ok = self.shell == ShellKind::Unknown || entry.shell == self.shell;
        text_ok && shell_ok && self.date.contains(&entry.timestamp)
    }
}

pub fn apply_filters(all: &[CommandEntry], filter: &FilterState) -> Vec<CommandEntry> {
    all.iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn t0() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 6, 12, 18, 0, 0)
            .single()
            .expect("valid time")
    }

    fn cmd(id: &str, command: &str, age_hours: i64, shell: ShellKind) -> CommandEntry {
        CommandEntry {
            id: id.to_string(),
            command: command.to_string(),
            directory: "/home/user/project".to_string(),
            timestamp: t0() - TimeDelta::hours(age_hours),
            shell,
            exit_code: 0,
            duration_ms: 5,
            tags: BTreeSet::new(),
        }
    }

    fn scenario() -> Vec<CommandEntry> {
        vec![
            cmd("1", "git status", 0, ShellKind::Bash),
            cmd("2", "npm install", 1, ShellKind::Bash),
            cmd("3", "git commit", 2, ShellKind::Bash),
            cmd("4", "docker ps", 25, ShellKind::Bash),
        ]
    }

    fn ids(entries: &[CommandEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .expect("valid time")
    }

    #[test]
    fn scenario_text_shell_and_date_compose() {
        let all = scenario();
        let mut filter = FilterState::default();

        filter.set_query("git");
        let got = apply_filters(&all, &filter);
        assert_eq!(ids(&got), vec!["1", "3"]);
        assert_eq!(got[0].command, "git status");

        filter.set_shell(ShellKind::Bash);
        assert_eq!(ids(&apply_filters(&all, &filter)), vec!["1", "3"]);

        let mut today_only = FilterState::default();
        today_only.enable_date(t0());
        assert_eq!(ids(&apply_filters(&all, &today_only)), vec!["1", "2", "3"]);

        filter.enable_date(t0());
        assert_eq!(ids(&apply_filters(&all, &filter)), vec!["1", "3"]);
    }

    #[test]
    fn query_match_ignores_case() {
        let all = vec![cmd("1", "Git Push --Force", 0, ShellKind::Zsh)];
        let mut filter = FilterState::default();
        filter.set_query("PUSH");
        assert_eq!(apply_filters(&all, &filter).len(), 1);
    }

    #[test]
    fn conjunction_equals_intersection_of_single_predicates() {
        let all = vec![
            cmd("1", "git status", 0, ShellKind::Bash),
            cmd("2", "git log", 3, ShellKind::Zsh),
            cmd("3", "Get-ChildItem", 30, ShellKind::PowerShell),
            cmd("4", "git fetch", 30, ShellKind::Bash),
            cmd("5", "dir", 200, ShellKind::Cmd),
        ];

        for query in ["", "git", "GET", "zzz"] {
            for shell in ShellKind::ALL {
                for preset in [None, Some(DatePreset::Today), Some(DatePreset::Yesterday)] {
                    let mut combined = FilterState::default();
                    combined.set_query(query);
                    combined.set_shell(shell);
                    if let Some(preset) = preset {
                        combined.select_date_preset(preset, t0());
                    }

                    let mut text = FilterState::default();
                    text.set_query(query);
                    let mut by_shell = FilterState::default();
                    by_shell.set_shell(shell);
                    let mut by_date = FilterState::default();
                    if let Some(preset) = preset {
                        by_date.select_date_preset(preset, t0());
                    }

                    let expected: Vec<&str> = all
                        .iter()
                        .filter(|e| text.matches(e) && by_shell.matches(e) && by_date.matches(e))
                        .map(|e| e.id.as_str())
                        .collect();
                    let got = apply_filters(&all, &combined);
                    assert_eq!(ids(&got), expected, "{query:?} {shell:?} {preset:?}");
                }
            }
        }
    }

    #[test]
    fn clear_is_canonical_and_restores_everything() {
        let all = scenario();
        let mut filter = FilterState::default();
        filter.set_query("docker");
        filter.cycle_shell();
        filter.enable_date(t0());
        assert!(filter.is_active());

        filter.clear();
        assert_eq!(filter, FilterState::default());
        assert!(!filter.is_active());
        assert_eq!(apply_filters(&all, &filter), all);

        filter.clear();
        assert_eq!(filter, FilterState::default());
    }

    #[test]
    fn disabling_date_filter_resets_all_predicates() {
        let mut filter = FilterState::default();
        filter.set_query("git");
        filter.set_shell(ShellKind::Zsh);
        filter.enable_date(t0());

        filter.disable_date();

        assert_eq!(filter, FilterState::default());
    }

    #[test]
    fn enabling_date_filter_starts_at_today() {
        let mut filter = FilterState::default();
        filter.enable_date(t0());
        assert!(filter.date().enabled);
        assert_eq!(filter.date().preset, DatePreset::Today);
        assert!(filter.date().start.is_some());
        assert!(filter.date().end.is_some());
    }

    #[test]
    fn preset_cycle_wraps_and_re_resolves() {
        let mut filter = FilterState::default();
        filter.enable_date(t0());
        let mut order = Vec::new();
        for _ in 0..6 {
            filter.cycle_date_preset(t0());
            order.push(filter.date().preset);
        }
        assert_eq!(
            order,
            vec![
                DatePreset::Yesterday,
                DatePreset::ThisWeek,
                DatePreset::LastWeek,
                DatePreset::ThisMonth,
                DatePreset::LastMonth,
                DatePreset::Today,
            ]
        );

        filter.cycle_date_preset(t0());
        let (start, _) = DatePreset::Yesterday.resolve(&t0());
        assert_eq!(filter.date().start, Some(start));
    }

    #[test]
    fn day_presets_resolve_to_midnight_boundaries() {
        let now = utc(2024, 6, 12, 15, 30);
        assert_eq!(
            DatePreset::Today.resolve(&now),
            (utc(2024, 6, 12, 0, 0), utc(2024, 6, 13, 0, 0))
        );
        assert_eq!(
            DatePreset::Yesterday.resolve(&now),
            (utc(2024, 6, 11, 0, 0), utc(2024, 6, 12, 0, 0))
        );
    }

    #[test]
    fn boundaries_are_midnight_in_the_caller_zone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).expect("offset");
        let now = tokyo
            .with_ymd_and_hms(2024, 6, 12, 1, 30, 0)
            .single()
            .expect("valid time");

        let (start, end) = DatePreset::Today.resolve(&now);

        let midnight = NaiveDate::from_ymd_opt(2024, 6, 12)
            .expect("date")
            .and_time(NaiveTime::MIN);
        assert_eq!(start.naive_local(), midnight);
        assert_eq!(start.with_timezone(&Utc), utc(2024, 6, 11, 15, 0));
        assert_eq!(end.naive_local().time(), NaiveTime::MIN);
        assert_eq!(end.date_naive(), start.date_naive() + Days::new(1));

        let (week_start, week_end) = DatePreset::ThisWeek.resolve(&now);
        assert_eq!(week_start.naive_local().time(), NaiveTime::MIN);
        assert_eq!(week_end.naive_local().time(), NaiveTime::MIN);
        assert_eq!(week_end.date_naive(), week_start.date_naive() + Days::new(7));
    }

    #[test]
    fn week_presets_start_on_monday() {
        let wednesday = utc(2024, 6, 12, 15, 30);
        assert_eq!(
            DatePreset::ThisWeek.resolve(&wednesday),
            (utc(2024, 6, 10, 0, 0), utc(2024, 6, 17, 0, 0))
        );
        assert_eq!(
            DatePreset::LastWeek.resolve(&wednesday),
            (utc(2024, 6, 3, 0, 0), utc(2024, 6, 10, 0, 0))
        );

        let sunday = utc(2024, 6, 16, 23, 59);
        assert_eq!(DatePreset::ThisWeek.resolve(&sunday).0, utc(2024, 6, 10, 0, 0));

        let monday = utc(2024, 6, 17, 0, 0);
        assert_eq!(DatePreset::ThisWeek.resolve(&monday).0, monday);
    }

    #[test]
    fn month_presets_cross_year_boundary() {
        let mid_june = utc(2024, 6, 12, 15, 30);
        assert_eq!(
            DatePreset::ThisMonth.resolve(&mid_june),
            (utc(2024, 6, 1, 0, 0), utc(2024, 7, 1, 0, 0))
        );

        let january = utc(2024, 1, 15, 8, 0);
        assert_eq!(
            DatePreset::LastMonth.resolve(&january),
            (utc(2023, 12, 1, 0, 0), utc(2024, 1, 1, 0, 0))
        );
        let december = utc(2023, 12, 31, 23, 0);
        assert_eq!(DatePreset::ThisMonth.resolve(&december).1, utc(2024, 1, 1, 0, 0));
    }

    #[test]
    fn date_window_is_inclusive_at_both_resolved_ends() {
        let filter = DateFilter::resolved(DatePreset::Today, t0());
        let start = filter.start.expect("start");
        let end = filter.end.expect("end");
        assert!(filter.contains(&start));
        assert!(filter.contains(&end));
        assert!(!filter.contains(&(end + TimeDelta::nanoseconds(1))));
        assert!(!filter.contains(&(start - TimeDelta::nanoseconds(1))));
    }

    #[test]
    fn digits_map_to_presets_in_cycle_order() {
        assert_eq!(DatePreset::from_digit('1'), Some(DatePreset::Today));
        assert_eq!(DatePreset::from_digit('6'), Some(DatePreset::LastMonth));
        assert_eq!(DatePreset::from_digit('0'), None);
        assert_eq!(DatePreset::from_digit('7'), None);
    }

    #[test]
    fn filtering_preserves_input_order() {
        let all = scenario();
        let mut filter = FilterState::default();
        filter.set_query("m");
        let got = apply_filters(&all, &filter);
        assert_eq!(ids(&got), vec!["2", "3"]);
    }
}
