//! Weekly availability model.
//!
//! The backend reports availability as a set of `(weekday, seconds)`
//! entries. The client works with a fixed seven-slot structure in hours,
//! one slot per weekday. Weekdays missing from the backend entries are
//! filled from a default week.
//!
//! # Precision
//! Hours are stored as `f64`. Conversion back to seconds rounds to the
//! nearest whole second, so whole-second inputs survive a round trip.

use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Day of the week, as named by the backend schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based slot index, Monday = 0.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(value: chrono::Weekday) -> Self {
        Weekday::ALL[value.num_days_from_monday() as usize]
    }
}

impl From<Weekday> for chrono::Weekday {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
            Weekday::Sunday => chrono::Weekday::Sun,
        }
    }
}

/// Working hours per weekday.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Availability {
    pub mo: f64,
    pub tu: f64,
    pub we: f64,
    pub th: f64,
    pub fr: f64,
    pub sa: f64,
    pub su: f64,
}

impl Availability {
    /// A week with no working hours.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Eight hours Monday to Friday, nothing on weekends.
    pub fn standard_week() -> Self {
        Self::uniform_workdays(8.0)
    }

    /// The same number of hours on every workday, nothing on weekends.
    pub fn uniform_workdays(hours: f64) -> Self {
        Self {
            mo: hours,
            tu: hours,
            we: hours,
            th: hours,
            fr: hours,
            sa: 0.0,
            su: 0.0,
        }
    }

    /// Hours available on `day`.
    pub fn hours(&self, day: Weekday) -> f64 {
        match day {
            Weekday::Monday => self.mo,
            Weekday::Tuesday => self.tu,
            Weekday::Wednesday => self.we,
            Weekday::Thursday => self.th,
            Weekday::Friday => self.fr,
            Weekday::Saturday => self.sa,
            Weekday::Sunday => self.su,
        }
    }

    /// Sets the hours for `day`. Negative values are clamped to zero.
    pub fn set_hours(&mut self, day: Weekday, hours: f64) {
        let hours = hours.max(0.0);
        match day {
            Weekday::Monday => self.mo = hours,
            Weekday::Tuesday => self.tu = hours,
            Weekday::Wednesday => self.we = hours,
            Weekday::Thursday => self.th = hours,
            Weekday::Friday => self.fr = hours,
            Weekday::Saturday => self.sa = hours,
            Weekday::Sunday => self.su = hours,
        }
    }

    /// Builder-style variant of [`set_hours`](Self::set_hours).
    pub fn with_hours(mut self, day: Weekday, hours: f64) -> Self {
        self.set_hours(day, hours);
        self
    }

    /// Normalizes backend `(weekday, seconds)` entries.
    ///
    /// Slots without an entry take their value from `default`, or zero when
    /// no default is given. If a weekday appears more than once, the last
    /// entry wins.
    pub fn from_entries<I>(entries: I, default: Option<&Availability>) -> Self
    where
        I: IntoIterator<Item = (Weekday, i32)>,
    {
        let mut result = default.copied().unwrap_or_default();
        for (day, seconds) in entries {
            result.set_hours(day, f64::from(seconds) / SECONDS_PER_HOUR);
        }
        result
    }

    /// Converts back to `(weekday, seconds)` entries, one per weekday.
    pub fn to_entries(&self) -> Vec<(Weekday, i32)> {
        Weekday::ALL
            .iter()
            .map(|&day| (day, (self.hours(day) * SECONDS_PER_HOUR).round() as i32))
            .collect()
    }

    /// Total hours over the whole week.
    pub fn weekly_hours(&self) -> f64 {
        Weekday::ALL.iter().map(|&d| self.hours(d)).sum()
    }

    /// Whether any hours are available on `day`.
    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.hours(day) > 0.0
    }
}
