//! Raid slot arithmetic.
//!
//! Raids start every 8 hours on the raid grid (00:00, 08:00, 16:00). The grid
//! may be shifted against server-local time by a whole number of hours. A slot
//! that lands on 17:00 server time is moved by one full slot: forward when
//! looking for the next raid, backward when looking for the last one.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Offset, Timelike, Utc};

/// Hours between two consecutive raids.
pub const SLOT_HOURS: i64 = 8;

/// Server-local hour no raid may start at.
pub const BLACKOUT_HOUR: u32 = 17;

/// A raid start time in server-local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RaidSlot(NaiveDateTime);

impl RaidSlot {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at)
    }

    pub fn at(&self) -> NaiveDateTime {
        self.0
    }

    /// Storage key: seconds of the local timestamp read as if it were UTC.
    pub fn key(&self) -> i64 {
        self.0.and_utc().timestamp()
    }

    pub fn from_key(key: i64) -> Option<Self> {
        DateTime::from_timestamp(key, 0).map(|dt| Self(dt.naive_utc()))
    }

    /// The slot `n` raids earlier, without blackout correction.
    #[must_use]
    pub fn previous(&self, n: i64) -> Self {
        Self(self.0 - Duration::hours(SLOT_HOURS * n))
    }

    fn is_blackout(at: NaiveDateTime) -> bool {
        at.hour() == BLACKOUT_HOUR && at.minute() == 0 && at.second() == 0 && at.nanosecond() == 0
    }
}

impl fmt::Display for RaidSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d.%m %H:%M"))
    }
}

/// Computes raid slots relative to server-local time.
#[derive(Debug, Clone, Copy)]
pub struct RaidClock {
    grid_offset: Duration,
    utc_offset: FixedOffset,
}

impl Default for RaidClock {
    fn default() -> Self {
        Self {
            grid_offset: Duration::zero(),
            utc_offset: Utc.fix(),
        }
    }
}

impl RaidClock {
    /// `grid_offset_hours`: server-local time minus raid-grid time.
    /// `utc_offset_hours`: server-local time minus UTC.
    pub fn new(grid_offset_hours: i32, utc_offset_hours: i32) -> Self {
        Self {
            grid_offset: Duration::hours(i64::from(grid_offset_hours)),
            utc_offset: FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix()),
        }
    }

    /// Server-local wall-clock time for an instant.
    pub fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.utc_offset).naive_local()
    }

    pub fn now(&self) -> NaiveDateTime {
        self.local(Utc::now())
    }

    /// First raid strictly after `now`.
    pub fn next_slot(&self, now: NaiveDateTime) -> RaidSlot {
        let grid_now = now - self.grid_offset;
        let day_start = grid_now.date().and_time(NaiveTime::MIN);
        let elapsed = (grid_now - day_start).num_seconds();
        let passed = elapsed.div_euclid(SLOT_HOURS * 3600);
        let grid_slot = day_start + Duration::hours(SLOT_HOURS * (passed + 1));

        let slot = grid_slot + self.grid_offset;
        if RaidSlot::is_blackout(slot) {
            RaidSlot(slot + Duration::hours(SLOT_HOURS))
        } else {
            RaidSlot(slot)
        }
    }

    /// The raid that most recently started (or starts exactly at `now`).
    pub fn last_slot(&self, now: NaiveDateTime) -> RaidSlot {
        let slot = self.next_slot(now).0 - Duration::hours(SLOT_HOURS);
        if RaidSlot::is_blackout(slot) {
            RaidSlot(slot - Duration::hours(SLOT_HOURS))
        } else {
            RaidSlot(slot)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn rounds_up_to_next_boundary() {
        let clock = RaidClock::default();
        assert_eq!(clock.next_slot(at(10, 0, 0, 1)).at(), at(10, 8, 0, 0));
        assert_eq!(clock.next_slot(at(10, 7, 59, 59)).at(), at(10, 8, 0, 0));
        assert_eq!(clock.next_slot(at(10, 9, 0, 0)).at(), at(10, 16, 0, 0));
        assert_eq!(clock.next_slot(at(10, 23, 30, 0)).at(), at(11, 0, 0, 0));
    }

    #[test]
    fn boundary_moves_to_following_slot() {
        let clock = RaidClock::default();
        assert_eq!(clock.next_slot(at(10, 8, 0, 0)).at(), at(10, 16, 0, 0));
        assert_eq!(clock.last_slot(at(10, 8, 0, 0)).at(), at(10, 8, 0, 0));
    }

    #[test]
    fn reapplying_next_slot_always_advances() {
        for offset in [0, 1, 3, -2] {
            let clock = RaidClock::new(offset, 0);
            for hour in 0..24 {
                for minute in [0, 1, 59] {
                    let t = at(10, hour, minute, 0);
                    let next = clock.next_slot(t);
                    assert!(clock.next_slot(next.at()) > next, "offset {offset} at {t}");
                    assert!(next.at() > t);
                }
            }
        }
    }

    #[test]
    fn last_is_eight_hours_before_next_outside_blackout() {
        let clock = RaidClock::default();
        for hour in 0..24 {
            let t = at(12, hour, 30, 0);
            let next = clock.next_slot(t);
            assert_eq!(clock.last_slot(t), next.previous(1));
            assert!(clock.last_slot(t).at() <= t);
        }
    }

    #[test]
    fn seventeen_o_clock_is_pushed_to_one_next_day() {
        // Grid shifted one hour ahead: 01:00, 09:00, 17:00 local.
        let clock = RaidClock::new(1, 0);
        assert_eq!(clock.next_slot(at(10, 15, 30, 0)).at(), at(11, 1, 0, 0));
        assert_eq!(clock.next_slot(at(10, 9, 0, 0)).at(), at(11, 1, 0, 0));
        assert_eq!(clock.next_slot(at(10, 8, 59, 0)).at(), at(10, 9, 0, 0));
    }

    #[test]
    fn last_slot_skips_blackout_backwards() {
        let clock = RaidClock::new(1, 0);
        // next is 01:00 (pushed), naive last would be 17:00, so 09:00 is used.
        assert_eq!(clock.last_slot(at(10, 20, 0, 0)).at(), at(10, 9, 0, 0));
        assert_eq!(clock.last_slot(at(10, 10, 0, 0)).at(), at(10, 9, 0, 0));
        // Outside the exception last = next - 8h.
        assert_eq!(clock.last_slot(at(11, 3, 0, 0)).at(), at(11, 1, 0, 0));
        assert_eq!(clock.next_slot(at(11, 3, 0, 0)).previous(1), clock.last_slot(at(11, 3, 0, 0)));
    }

    #[test]
    fn slot_key_roundtrip() {
        let slot = RaidSlot::new(at(10, 16, 0, 0));
        assert_eq!(RaidSlot::from_key(slot.key()), Some(slot));
        assert_eq!(slot.to_string(), "10.03 16:00");
    }

    #[test]
    fn local_time_uses_utc_offset() {
        let clock = RaidClock::new(0, 3);
        let utc = at(10, 22, 0, 0).and_utc();
        assert_eq!(clock.local(utc), at(11, 1, 0, 0));
    }
}
