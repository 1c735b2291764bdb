//! Seeded in-memory calendars for running the gateway without a calendar
//! service (`CALENDAR_API_URL` unset).

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveTime};
use stayline_core::calendar::MAX_WINDOW_DAYS;
use stayline_core::inventory::InventoryDay;
use stayline_core::rates::RateDay;
use stayline_core::types::{CalendarDate, DbId};
use stayline_grid::memory::MemoryCalendar;
use stayline_grid::CalendarBackend;

use crate::session::BackendFactory;

/// Room types per property: (offset, total rooms).
const ROOM_TYPES: [(DbId, u32); 3] = [(1, 20), (2, 12), (3, 4)];

/// Rate plans per property: (offset, base rate, has a booking cutoff).
const RATE_PLANS: [(DbId, f64, bool); 2] = [(1, 129.0, true), (2, 159.0, false)];

/// Fresh seeded calendars per property, starting at `start` and covering
/// the longest loadable window.
pub struct DemoBackends {
    start: CalendarDate,
}

impl DemoBackends {
    pub fn new(start: CalendarDate) -> Self {
        Self { start }
    }

    fn days(&self) -> impl Iterator<Item = CalendarDate> + '_ {
        (0..MAX_WINDOW_DAYS).map(move |offset| self.start + Duration::days(offset))
    }
}

/// Room ids are `property * 100 + n`, rate plan ids `property * 10 + n`.
pub fn inventory_rows(property_id: DbId, days: impl Iterator<Item = CalendarDate>) -> Vec<InventoryDay> {
    days.flat_map(|date| {
        ROOM_TYPES.iter().map(move |&(offset, total)| {
            let weekend = date.weekday().number_from_monday() >= 6;
            let sold = if weekend { total * 3 / 4 } else { total / 4 };
            InventoryDay::new(property_id * 100 + offset, date, total, sold, 0)
        })
    })
    .collect()
}

pub fn rate_rows(property_id: DbId, days: impl Iterator<Item = CalendarDate>) -> Vec<RateDay> {
    let cutoff = NaiveTime::from_hms_opt(18, 0, 0);
    days.flat_map(|date| {
        RATE_PLANS.iter().map(move |&(offset, base_rate, has_cutoff)| RateDay {
            rate_plan_id: property_id * 10 + offset,
            date,
            base_rate,
            extra_adult_charge: 25.0,
            min_stay: 1,
            max_stay: 14,
            cutoff_time: if has_cutoff { cutoff } else { None },
        })
    })
    .collect()
}

impl BackendFactory for DemoBackends {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn inventory(&self, property_id: DbId) -> Arc<dyn CalendarBackend<InventoryDay>> {
        Arc::new(MemoryCalendar::new(inventory_rows(property_id, self.days())))
    }

    fn rates(&self, property_id: DbId) -> Arc<dyn CalendarBackend<RateDay>> {
        Arc::new(MemoryCalendar::new(rate_rows(property_id, self.days())))
    }
}

#[cfg(test)]
mod tests {
    use stayline_core::calendar::parse_date;
    use stayline_core::inventory::RoomStatus;

    use super::*;

    #[test]
    fn seeds_every_entity_for_every_day() {
        let start = parse_date("2025-05-02").unwrap(); // Friday
        let days = || (0..3).map(move |d| start + Duration::days(d));

        let inventory = inventory_rows(7, days());
        assert_eq!(inventory.len(), 9);
        assert_eq!(inventory[0].room_id, 701);
        assert_eq!(inventory[0].available, 15);

        // Saturday is busier; the 4-room type sells out at 3 of 4.
        let saturday_small = inventory
            .iter()
            .find(|r| r.room_id == 703 && r.date == parse_date("2025-05-03").unwrap())
            .unwrap();
        assert_eq!(saturday_small.available, 1);
        assert_eq!(saturday_small.status, RoomStatus::Open);

        let rates = rate_rows(7, days());
        assert_eq!(rates.len(), 6);
        assert!(rates.iter().filter(|r| r.rate_plan_id == 72).all(|r| r.cutoff_time.is_none()));
    }
}
