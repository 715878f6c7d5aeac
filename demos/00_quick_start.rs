/// quick start - book a room, check in, pay and check out
use front_desk_rs::{
    Actor, CheckInRequest, DeskConfig, EchoDocumentValidator, FrontDesk, GuestDetails, IdentityPhoto, Money, NewReservation, NewRoom,
    NoopNotifier, PaymentMethod, PaymentRequest, SafeTimeProvider, Stay, TimeSource,
};
use chrono::{NaiveDate, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap()));
    let admin = Actor::admin("marta");
    let counter = Actor::counter("luis");

    let mut desk = FrontDesk::new(DeskConfig::default(), NoopNotifier, EchoDocumentValidator)?;
    let room = desk.add_room(&admin, NewRoom::new("101", 1, "matrimonial", Money::from_major(99)))?;

    // two nights
    let stay = Stay::nights(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
    );
    let reservation = desk.create_reservation(
        &counter,
        NewReservation::new(room, GuestDetails::new("Rosa Quispe", "45871236"), stay),
        &time,
    )?;
    println!("reservation #{} total {}", reservation.code, reservation.total_amount);

    desk.check_in(
        &counter,
        reservation.id,
        CheckInRequest {
            phone: "987654321".to_string(),
            email: "rosa@example.com".to_string(),
            photo: IdentityPhoto::new("dni.jpg", b"45871236".to_vec()),
        },
        &time,
    )?;

    desk.add_payment(&counter, reservation.id, PaymentRequest::new(Money::from_major(198), PaymentMethod::Cash), &time)?;
    desk.check_out(&counter, reservation.id, &time)?;

    println!("{}", desk.reservation_detail(reservation.id)?.to_json_pretty()?);

    Ok(())
}
