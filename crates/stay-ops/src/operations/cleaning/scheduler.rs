use super::domain::{TimeRange, TimeSlot};
use chrono::{Duration, NaiveDateTime};

const LOOKAHEAD_DAYS: i64 = 7;

/// Places a cleaning window of at most `duration_min` minutes at or after
/// `checkout`, inside the first allowed daily range that can host it.
///
/// Ranges are scanned day-major in the order given — their order is the
/// tie-break and is deliberately not re-sorted. When checkout lands inside
/// a range the slot starts immediately at checkout rather than waiting for
/// the range boundary. Slots are clipped at the range end and may come out
/// shorter than the requested duration.
pub fn compute_slot(
    checkout: NaiveDateTime,
    ranges: &[TimeRange],
    duration_min: i64,
) -> TimeSlot {
    let duration = Duration::minutes(duration_min);
    if ranges.is_empty() {
        return TimeSlot {
            from: checkout,
            to: checkout + duration,
        };
    }

    for offset in 0..LOOKAHEAD_DAYS {
        let day = checkout.date() + Duration::days(offset);
        for range in ranges {
            let range_start = day.and_time(range.from);
            let range_end = day.and_time(range.to);

            if offset == 0 && checkout >= range_start && checkout < range_end {
                return TimeSlot {
                    from: checkout,
                    to: (checkout + duration).min(range_end),
                };
            }

            if range_start >= checkout {
                return TimeSlot {
                    from: range_start,
                    to: (range_start + duration).min(range_end),
                };
            }
        }
    }

    TimeSlot {
        from: checkout,
        to: checkout + duration,
    }
}
