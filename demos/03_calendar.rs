/// calendar - availability grid and cash summary
use front_desk_rs::{
    Actor, DeskConfig, DisplayStatus, EchoDocumentValidator, FrontDesk, GuestDetails, Money, NewReservation,
    NewRoom, NoopNotifier, SafeTimeProvider, Stay, TimeSource,
};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

fn symbol(status: DisplayStatus) -> char {
    match status {
        DisplayStatus::Available => '.',
        DisplayStatus::Completed => 'c',
        DisplayStatus::Reserved => 'R',
        DisplayStatus::Cleaning => 'L',
        DisplayStatus::Occupied => 'O',
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap()));
    let admin = Actor::admin("marta");
    let counter = Actor::counter("luis");
    let day = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();

    let mut desk = FrontDesk::new(DeskConfig::default(), NoopNotifier, EchoDocumentValidator)?;
    let r101 = desk.add_room(&admin, NewRoom::new("101", 1, "simple", Money::from_major(60)))?;
    let r102 = desk.add_room(&admin, NewRoom::new("102", 1, "doble", Money::from_major(99)))?;
    desk.add_room(&admin, NewRoom::new("201", 2, "suite", Money::from_major(150)))?;

    desk.create_reservation(
        &counter,
        NewReservation::new(r101, GuestDetails::new("Rosa Quispe", "45871236"), Stay::nights(day(2), day(5))),
        &time,
    )?;
    desk.create_reservation(
        &counter,
        NewReservation::new(r102, GuestDetails::new("Jorge Mamani", "40223344"), Stay::nights(day(4), day(8))),
        &time,
    )?;
    let hourly = Stay::hourly(
        day(3),
        NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    );
    desk.create_reservation(
        &counter,
        NewReservation::new(r102, GuestDetails::new("Ana Flores", "41556677"), hourly),
        &time,
    )?;

    let grid = desk.availability(day(1), day(10))?;
    print!("room ");
    for date in &grid.dates {
        print!("{}", date.format("%d").to_string().chars().last().unwrap_or(' '));
    }
    println!();
    for row in &grid.rooms {
        print!("{:<5}", row.number);
        for date in &grid.dates {
            let status = grid.cell(row.id, *date).map(|c| c.status).unwrap_or(DisplayStatus::Available);
            print!("{}", symbol(status));
        }
        println!();
    }

    for floor in &grid.floors {
        println!("floor {}: {} rooms", floor.number, floor.room_count);
    }

    println!("\n{}", desk.cash_summary(day(1), day(1))?.to_json_pretty()?);

    Ok(())
}
