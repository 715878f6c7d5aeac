/// split payments - the waterfall over room, mak and makala
use front_desk_rs::{
    Actor, Bucket, CartItem, CheckInRequest, DeskConfig, EchoDocumentValidator, FrontDesk, GuestDetails,
    IdentityPhoto, Money, NewReservation, NewRoom, NoopNotifier, PaymentMethod, PaymentRequest, SafeTimeProvider,
    SaleRequest, Stay, TimeSource,
};
use chrono::{NaiveDate, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== split payments ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap()));
    let admin = Actor::admin("marta");
    let counter = Actor::counter("luis");

    let mut desk = FrontDesk::new(DeskConfig::default(), NoopNotifier, EchoDocumentValidator)?;
    let room = desk.add_room(&admin, NewRoom::new("301", 3, "suite", Money::from_major(100)))?;
    let snacks = desk.add_product(&admin, "Piqueo", Money::from_major(15), 10, &time)?;

    let stay = Stay::nights(
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
    );
    let reservation = desk.create_reservation(
        &counter,
        NewReservation::new(room, GuestDetails::new("Jorge Mamani", "40223344"), stay),
        &time,
    )?;
    desk.check_in(
        &counter,
        reservation.id,
        CheckInRequest {
            phone: "955111222".to_string(),
            email: "jorge@example.com".to_string(),
            photo: IdentityPhoto::new("dni.jpg", b"40223344".to_vec()),
        },
        &time,
    )?;

    // room 100, mak 30, makala 20
    desk.record_sale(
        &counter,
        SaleRequest::products(vec![CartItem::new(snacks, 2)], PaymentMethod::RoomCharge).for_room(room),
        &time,
    )?;
    desk.record_sale(
        &counter,
        SaleRequest::flat(Money::from_major(20), PaymentMethod::RoomCharge).for_room(room),
        &time,
    )?;

    for amount in [120, 30] {
        let result = desk.add_payment(
            &counter,
            reservation.id,
            PaymentRequest::new(Money::from_major(amount), PaymentMethod::Yape),
            &time,
        )?;
        println!("payment of {}", result.amount);
        for bucket in Bucket::WATERFALL {
            println!("  {:?}: {}", bucket, result.allocation.to(bucket));
        }
        println!("  outstanding: {}\n", result.outstanding);
    }

    println!("{}", serde_json::to_string_pretty(&desk.store().balance(reservation.id)?)?);

    Ok(())
}
