/// stay lifecycle - reserved, checked in, debt at checkout, cleaning, completed
use front_desk_rs::{
    Actor, CartItem, CheckInRequest, DeskConfig, DeskError, EchoDocumentValidator, FrontDesk, GuestDetails,
    IdentityPhoto, MemoryNotifier, Money, NewReservation, NewRoom, PaymentMethod, PaymentRequest, SafeTimeProvider,
    Stay, TimeSource,
};
use chrono::{Duration, NaiveDate, TimeZone, Utc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== stay lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 1, 14, 0, 0).unwrap()));
    let controller = time.test_control().unwrap();
    let admin = Actor::admin("marta");
    let counter = Actor::counter("luis");

    let notifier = MemoryNotifier::new();
    let mut desk = FrontDesk::new(DeskConfig::default(), notifier.clone(), EchoDocumentValidator)?;
    let room = desk.add_room(&admin, NewRoom::new("204", 2, "doble", Money::from_major(99)))?;
    let beer = desk.add_product(&admin, "Cerveza", Money::from_major(10), 24, &time)?;

    // 1. booking
    println!("1. booking");
    let stay = Stay::nights(
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
    );
    let request = NewReservation::new(room, GuestDetails::new("Rosa Quispe", "45871236"), stay)
        .with_prepaid(Money::from_major(50), PaymentMethod::Yape);
    let reservation = desk.create_reservation(&counter, request, &time)?;
    println!("  reservation #{}: {} ({})", reservation.code, reservation.total_amount, reservation.status);

    // 2. check-in
    println!("\n2. check-in");
    let checked_in = desk.check_in(
        &counter,
        reservation.id,
        CheckInRequest {
            phone: "987654321".to_string(),
            email: "rosa@example.com".to_string(),
            photo: IdentityPhoto::new("dni.jpg", b"45871236".to_vec()),
        },
        &time,
    )?;
    println!("  status: {}", checked_in.status);
    println!("  room: {:?}", desk.store().room_status(room)?);

    // 3. consumption during the stay
    println!("\n3. consumption");
    controller.advance(Duration::hours(6));
    desk.add_consumption(&counter, reservation.id, vec![CartItem::new(beer, 3)], None, &time)?;
    println!("  outstanding: {}", desk.store().balance(reservation.id)?.outstanding());

    // 4. checkout blocked by debt
    println!("\n4. checkout");
    controller.advance(Duration::days(1));
    match desk.check_out(&counter, reservation.id, &time) {
        Err(DeskError::DebtRemaining { debt }) => println!("  ✗ blocked, debt {}", debt),
        other => println!("  unexpected: {:?}", other.map(|r| r.status)),
    }

    let debt = desk.store().balance(reservation.id)?.outstanding();
    desk.add_payment(&counter, reservation.id, PaymentRequest::new(debt, PaymentMethod::Cash), &time)?;
    desk.check_out(&counter, reservation.id, &time)?;
    println!("  ✓ checked out, room {:?}", desk.store().room_status(room)?);

    // 5. housekeeping
    println!("\n5. housekeeping");
    desk.mark_room_clean(&counter, room, &time)?;
    println!("  room {:?}", desk.store().room_status(room)?);
    println!("  reservation {}", desk.store().reservation(reservation.id)?.status);

    println!("\nnotifications sent: {}", notifier.sent().len());
    println!("events recorded: {}", desk.events.events().len());

    Ok(())
}
