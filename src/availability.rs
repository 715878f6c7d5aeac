use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{DeskError, Result};
use crate::reservation::{Reservation, Room};
use crate::types::{ReservationCode, ReservationId, ReservationKind, ReservationStatus, RoomId, RoomStatus};

/// calendar status of one room on one day, ordered by display priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Available = 0,
    Completed = 1,
    Reserved = 2,
    Cleaning = 3,
    Occupied = 4,
}

/// lowest to highest; a cell shows the highest status among its reservations
pub const DISPLAY_PRIORITY: [DisplayStatus; 5] = [
    DisplayStatus::Available,
    DisplayStatus::Completed,
    DisplayStatus::Reserved,
    DisplayStatus::Cleaning,
    DisplayStatus::Occupied,
];

impl DisplayStatus {
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn from_lifecycle(status: ReservationStatus) -> Self {
        match status {
            ReservationStatus::CheckedIn => DisplayStatus::Occupied,
            ReservationStatus::CheckedOut => DisplayStatus::Cleaning,
            ReservationStatus::Completed => DisplayStatus::Completed,
            _ => DisplayStatus::Reserved,
        }
    }
}

/// reservation as listed inside a calendar cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellReservation {
    pub id: ReservationId,
    pub code: ReservationCode,
    pub guest_name: Option<String>,
    pub status: ReservationStatus,
    pub kind: ReservationKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityCell {
    pub status: DisplayStatus,
    pub available: bool,
    /// reservation that decided the status
    pub primary: Option<ReservationId>,
    pub reservations: Vec<CellReservation>,
}

impl Default for AvailabilityCell {
    fn default() -> Self {
        Self {
            status: DisplayStatus::Available,
            available: true,
            primary: None,
            reservations: Vec::new(),
        }
    }
}

impl AvailabilityCell {
    /// fold one more reservation into the cell
    fn push(&mut self, reservation: CellReservation) {
        let status = DisplayStatus::from_lifecycle(reservation.status);
        if status > self.status {
            self.status = status;
        }
        if status >= self.status || self.primary.is_none() {
            self.primary = Some(reservation.id);
        }
        if reservation.status != ReservationStatus::Completed {
            self.available = false;
        }
        self.reservations.push(reservation);
    }
}

/// room header row of the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRow {
    pub id: RoomId,
    pub number: String,
    pub floor: u32,
    pub room_type: String,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorSummary {
    pub number: u32,
    pub room_count: usize,
}

/// one status cell per room per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityGrid {
    pub rooms: Vec<RoomRow>,
    pub dates: Vec<NaiveDate>,
    pub availability: BTreeMap<RoomId, BTreeMap<NaiveDate, AvailabilityCell>>,
    pub floors: Vec<FloorSummary>,
}

impl AvailabilityGrid {
    pub fn cell(&self, room_id: RoomId, date: NaiveDate) -> Option<&AvailabilityCell> {
        self.availability.get(&room_id).and_then(|days| days.get(&date))
    }
}

/// read-only projection of reservations over an inclusive date window
#[derive(Debug, Clone, Copy)]
pub struct GridBuilder {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl GridBuilder {
    pub fn new(from: NaiveDate, to: NaiveDate, max_window_days: u32) -> Result<Self> {
        if to < from {
            return Err(DeskError::validation(format!("window ends before it starts ({} -> {})", from, to)));
        }
        let days = (to - from).num_days() + 1;
        if days > i64::from(max_window_days) {
            return Err(DeskError::validation(format!(
                "window of {} days exceeds the limit of {}",
                days, max_window_days
            )));
        }
        Ok(Self { from, to })
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.from.iter_days().take_while(|d| *d <= self.to).collect()
    }

    /// `rooms` carry their derived status; `guest_name` resolves names for the cells
    pub fn build<'a, R, G>(&self, rooms: &[(&Room, RoomStatus)], reservations: R, guest_name: G) -> AvailabilityGrid
    where
        R: IntoIterator<Item = &'a Reservation>,
        G: Fn(&Reservation) -> Option<String>,
    {
        let dates = self.dates();

        let mut rows: Vec<RoomRow> = rooms
            .iter()
            .map(|(room, status)| RoomRow {
                id: room.id,
                number: room.number.clone(),
                floor: room.floor,
                room_type: room.room_type.clone(),
                status: *status,
            })
            .collect();
        rows.sort_by(|a, b| a.floor.cmp(&b.floor).then_with(|| a.number.cmp(&b.number)));

        let mut availability: BTreeMap<RoomId, BTreeMap<NaiveDate, AvailabilityCell>> = rows
            .iter()
            .map(|row| {
                let days = dates.iter().map(|d| (*d, AvailabilityCell::default())).collect();
                (row.id, days)
            })
            .collect();

        for reservation in reservations {
            if reservation.is_deleted() || reservation.status == ReservationStatus::Cancelled {
                continue;
            }
            let Some(days) = availability.get_mut(&reservation.room_id) else {
                continue;
            };

            for date in dates.iter().filter(|d| reservation.stay.covers(**d)) {
                if let Some(cell) = days.get_mut(date) {
                    cell.push(CellReservation {
                        id: reservation.id,
                        code: reservation.code,
                        guest_name: guest_name(reservation),
                        status: reservation.status,
                        kind: reservation.stay.kind,
                        start_date: reservation.stay.start_date,
                        end_date: reservation.stay.end_date,
                        start_time: reservation.stay.start_time,
                        end_time: reservation.stay.end_time,
                    });
                }
            }
        }

        let mut floors: BTreeMap<u32, usize> = BTreeMap::new();
        for row in &rows {
            *floors.entry(row.floor).or_default() += 1;
        }

        AvailabilityGrid {
            rooms: rows,
            dates,
            availability,
            floors: floors
                .into_iter()
                .map(|(number, room_count)| FloorSummary { number, room_count })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::reservation::Stay;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn room(number: &str, floor: u32) -> Room {
        Room {
            id: Uuid::new_v4(),
            number: number.to_string(),
            floor,
            room_type: "doble".to_string(),
            price_per_night: Money::from_major(99),
            under_maintenance: false,
        }
    }

    fn reservation(room: &Room, stay: Stay, status: ReservationStatus) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            code: ReservationCode(1),
            room_id: room.id,
            guest_id: Uuid::new_v4(),
            stay,
            status,
            total_amount: Money::from_major(99),
            paid_amount: Money::ZERO,
            prepaid_amount: Money::ZERO,
            notes: None,
            created_by: None,
            created_at: now,
            last_status_change: now,
            deleted_at: None,
        }
    }

    #[test]
    fn test_priority_order() {
        let mut sorted = DISPLAY_PRIORITY;
        sorted.sort();
        assert_eq!(sorted, DISPLAY_PRIORITY);
        assert_eq!(DisplayStatus::Occupied.priority(), 4);
        assert_eq!(DisplayStatus::from_lifecycle(ReservationStatus::CheckedOut), DisplayStatus::Cleaning);
        assert_eq!(DisplayStatus::from_lifecycle(ReservationStatus::Reserved), DisplayStatus::Reserved);
    }

    #[test]
    fn test_checked_in_beats_reserved() {
        let r101 = room("101", 1);
        let hourly = Stay::hourly(
            date(2),
            chrono::NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            chrono::NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        );
        let reservations = vec![
            reservation(&r101, Stay::nights(date(1), date(3)), ReservationStatus::Reserved),
            reservation(&r101, hourly, ReservationStatus::CheckedIn),
        ];

        let builder = GridBuilder::new(date(1), date(3), 366).unwrap();
        let grid = builder.build(&[(&r101, RoomStatus::Occupied)], &reservations, |_| None);

        let cell = grid.cell(r101.id, date(2)).unwrap();
        assert_eq!(cell.status, DisplayStatus::Occupied);
        assert!(!cell.available);
        assert_eq!(cell.reservations.len(), 2);
        assert_eq!(cell.primary, Some(reservations[1].id));

        let first = grid.cell(r101.id, date(1)).unwrap();
        assert_eq!(first.status, DisplayStatus::Reserved);

        // checkout day stays free
        let last = grid.cell(r101.id, date(3)).unwrap();
        assert_eq!(last.status, DisplayStatus::Available);
        assert!(last.available);
    }

    #[test]
    fn test_completed_cells_stay_available() {
        let r201 = room("201", 2);
        let reservations = vec![reservation(&r201, Stay::nights(date(1), date(2)), ReservationStatus::Completed)];

        let grid = GridBuilder::new(date(1), date(1), 366)
            .unwrap()
            .build(&[(&r201, RoomStatus::Available)], &reservations, |_| Some("Rosa".to_string()));

        let cell = grid.cell(r201.id, date(1)).unwrap();
        assert_eq!(cell.status, DisplayStatus::Completed);
        assert!(cell.available);
        assert_eq!(cell.reservations[0].guest_name.as_deref(), Some("Rosa"));
    }

    #[test]
    fn test_cancelled_reservations_are_hidden() {
        let r101 = room("101", 1);
        let reservations = vec![reservation(&r101, Stay::nights(date(1), date(2)), ReservationStatus::Cancelled)];

        let grid = GridBuilder::new(date(1), date(1), 366)
            .unwrap()
            .build(&[(&r101, RoomStatus::Available)], &reservations, |_| None);
        assert!(grid.cell(r101.id, date(1)).unwrap().reservations.is_empty());
    }

    #[test]
    fn test_rooms_sorted_and_floors_summarized() {
        let a = room("201", 2);
        let b = room("102", 1);
        let c = room("101", 1);
        let rooms = [(&a, RoomStatus::Available), (&b, RoomStatus::Available), (&c, RoomStatus::Cleaning)];

        let grid = GridBuilder::new(date(1), date(7), 366)
            .unwrap()
            .build(&rooms, std::iter::empty::<&Reservation>(), |_| None);

        let numbers: Vec<_> = grid.rooms.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["101", "102", "201"]);
        assert_eq!(grid.dates.len(), 7);
        assert_eq!(
            grid.floors,
            vec![FloorSummary { number: 1, room_count: 2 }, FloorSummary { number: 2, room_count: 1 }]
        );
    }

    #[test]
    fn test_invalid_windows() {
        assert!(GridBuilder::new(date(5), date(1), 366).is_err());
        assert!(GridBuilder::new(date(1), date(31), 7).is_err());
    }
}
