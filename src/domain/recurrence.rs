//! Recurrence intervals for repeating tasks
//!
//! A `rec:` tag holds a compact interval such as `1d`, `2w3d` or `+1m`:
//! one or more `<count><unit>` pairs with units `d` (day), `b` (business
//! day), `w` (week), `m` (month) and `y` (year). A trailing count without a
//! unit means days.
//!
//! A leading `+` makes the recurrence *strict*: the next due date advances
//! from the previous due date. Without it, the next due date is computed
//! from the present moment.

use std::str::FromStr;

use chrono::{Days, Months, NaiveDate, NaiveDateTime};

use super::task::{TaskDate, TaskError};

/// A calendar-aware interval
///
/// Years and months are applied first (clamping to the end of shorter
/// months), then weeks and days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
}

impl Interval {
    fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    fn total_days(&self) -> u64 {
        u64::from(self.weeks) * 7 + u64::from(self.days)
    }

    pub fn add_to_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        date.checked_add_months(Months::new(self.total_months()?))?
            .checked_add_days(Days::new(self.total_days()))
    }

    pub fn add_to_datetime(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        dt.checked_add_months(Months::new(self.total_months()?))?
            .checked_add_days(Days::new(self.total_days()))
    }

    /// Adds the interval, keeping the date/date-time kind of `date`
    pub fn add_to(&self, date: TaskDate) -> Option<TaskDate> {
        match date {
            TaskDate::Date(d) => self.add_to_date(d).map(TaskDate::Date),
            TaskDate::DateTime(dt) => self.add_to_datetime(dt).map(TaskDate::DateTime),
        }
    }
}

/// A parsed `rec:` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub strict: bool,
    pub interval: Interval,
    expression: String,
}

impl Recurrence {
    /// The expression this recurrence was parsed from
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Picks the date the interval is added to
    ///
    /// Strict recurrence keeps the previous due date as is. Otherwise the
    /// anchor is today (for a date) or the current moment (for a date-time).
    /// Without a previous due date the anchor is the current moment.
    pub fn anchor(&self, current_due: Option<TaskDate>, now: NaiveDateTime) -> TaskDate {
        match current_due {
            None => TaskDate::DateTime(now),
            Some(due) if self.strict => due,
            Some(TaskDate::Date(_)) => TaskDate::Date(now.date()),
            Some(TaskDate::DateTime(_)) => TaskDate::DateTime(now),
        }
    }

    /// Computes the next due date
    pub fn next_due(
        &self,
        current_due: Option<TaskDate>,
        now: NaiveDateTime,
    ) -> Result<TaskDate, TaskError> {
        self.interval
            .add_to(self.anchor(current_due, now))
            .ok_or_else(|| TaskError::InvalidRecurrence(self.expression.clone()))
    }
}

impl FromStr for Recurrence {
    type Err = TaskError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let invalid = || TaskError::InvalidRecurrence(expression.to_string());

        let trimmed = expression.trim();
        let (strict, body) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(invalid());
        }

        let mut interval = Interval::default();
        let mut chars = body.chars().peekable();

        while chars.peek().is_some() {
            let mut count: u32 = 0;
            let mut digits = 0;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                count = count
                    .checked_mul(10)
                    .and_then(|n| n.checked_add(digit))
                    .ok_or_else(invalid)?;
                digits += 1;
                chars.next();
            }
            if digits == 0 {
                return Err(invalid());
            }

            let slot = match chars.next() {
                None | Some('d') => &mut interval.days,
                // TODO: skip weekends for `b`; it currently counts calendar days
                Some('b') => &mut interval.days,
                Some('w') => &mut interval.weeks,
                Some('m') => &mut interval.months,
                Some('y') => &mut interval.years,
                Some(unit) if unit.is_alphabetic() => {
                    return Err(TaskError::InvalidRecurrenceUnit {
                        unit,
                        expression: expression.to_string(),
                    })
                }
                Some(_) => return Err(invalid()),
            };
            *slot = slot.checked_add(count).ok_or_else(invalid)?;
        }

        Ok(Self {
            strict,
            interval,
            expression: expression.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> TaskDate {
        TaskDate::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn parse(s: &str) -> Recurrence {
        s.parse().unwrap()
    }

    #[test]
    fn parse_single_units() {
        assert_eq!(parse("1d").interval, Interval { days: 1, ..Interval::default() });
        assert_eq!(parse("2w").interval, Interval { weeks: 2, ..Interval::default() });
        assert_eq!(parse("1m").interval, Interval { months: 1, ..Interval::default() });
        assert_eq!(parse("3y").interval, Interval { years: 3, ..Interval::default() });
        assert!(!parse("1d").strict);
    }

    #[test]
    fn parse_composite_strict() {
        let rec = parse("+2w3d");
        assert!(rec.strict);
        assert_eq!(rec.interval, Interval { weeks: 2, days: 3, ..Interval::default() });
        assert_eq!(rec.expression(), "+2w3d");
    }

    #[test]
    fn bare_count_means_days() {
        assert_eq!(parse("5").interval, Interval { days: 5, ..Interval::default() });
        assert_eq!(parse("1w2").interval, Interval { weeks: 1, days: 2, ..Interval::default() });
    }

    #[test]
    fn repeated_units_accumulate() {
        assert_eq!(parse("1d2d").interval, Interval { days: 3, ..Interval::default() });
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = "1x".parse::<Recurrence>().unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidRecurrenceUnit {
                unit: 'x',
                expression: "1x".to_string()
            }
        );
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for expr in ["", "+", "w", "1-", "d1"] {
            assert!(
                matches!(expr.parse::<Recurrence>(), Err(TaskError::InvalidRecurrence(_))),
                "expected {expr:?} to be rejected"
            );
        }
    }

    #[test]
    fn weekly_from_due_date() {
        let now = at(2023, 5, 1, 9, 0);
        let next = parse("1w").next_due(Some(date(2023, 5, 1)), now).unwrap();
        assert_eq!(next, date(2023, 5, 8));
    }

    #[test]
    fn strict_monthly_ignores_now() {
        let now = at(2023, 7, 20, 9, 0);
        let next = parse("+1m").next_due(Some(date(2023, 5, 1)), now).unwrap();
        assert_eq!(next, date(2023, 6, 1));
    }

    #[test]
    fn month_addition_clamps_to_month_end() {
        let next = parse("+1m")
            .next_due(Some(date(2023, 1, 31)), at(2023, 1, 31, 0, 0))
            .unwrap();
        assert_eq!(next, date(2023, 2, 28));
    }

    #[test]
    fn non_strict_date_restarts_from_today() {
        let now = at(2023, 5, 10, 8, 0);
        let next = parse("1d").next_due(Some(date(2020, 1, 1)), now).unwrap();
        assert_eq!(next, date(2023, 5, 11));
    }

    #[test]
    fn non_strict_datetime_restarts_from_now() {
        let now = at(2023, 5, 10, 8, 30);
        let due = TaskDate::DateTime(at(2023, 5, 1, 18, 0));
        let next = parse("1d").next_due(Some(due), now).unwrap();
        assert_eq!(next, TaskDate::DateTime(at(2023, 5, 11, 8, 30)));
    }

    #[test]
    fn strict_datetime_keeps_time_of_day() {
        let now = at(2023, 5, 10, 8, 30);
        let due = TaskDate::DateTime(at(2023, 5, 1, 18, 0));
        let next = parse("+1w").next_due(Some(due), now).unwrap();
        assert_eq!(next, TaskDate::DateTime(at(2023, 5, 8, 18, 0)));
    }

    #[test]
    fn missing_due_date_starts_from_now() {
        let now = at(2023, 5, 10, 8, 30);
        let next = parse("+2d").next_due(None, now).unwrap();
        assert_eq!(next, TaskDate::DateTime(at(2023, 5, 12, 8, 30)));
    }

    #[test]
    fn business_days_count_as_calendar_days() {
        // 2023-05-05 is a Friday; the weekend is not skipped
        let next = parse("+1b")
            .next_due(Some(date(2023, 5, 5)), at(2023, 5, 5, 0, 0))
            .unwrap();
        assert_eq!(next, date(2023, 5, 6));
    }
}
