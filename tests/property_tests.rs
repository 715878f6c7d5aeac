use chrono::{NaiveDate, TimeZone, Utc};
use front_desk_rs::{
    Actor, BalanceSheet, Bucket, CartItem, CheckInRequest, DeskConfig, EchoDocumentValidator, FrontDesk,
    GuestDetails, IdentityPhoto, Money, NewReservation, NewRoom, NoopNotifier, PaymentAllocator, PaymentMethod,
    PaymentRequest, SafeTimeProvider, Stay, StockBook, TimeSource,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// split `total` at the given cut points into positive parts
fn partition(total: i64, cuts: &[i64]) -> Vec<i64> {
    let mut points: Vec<i64> = cuts.iter().map(|c| c % (total + 1)).collect();
    points.push(0);
    points.push(total);
    points.sort_unstable();
    points.dedup();
    points.windows(2).map(|w| w[1] - w[0]).filter(|p| *p > 0).collect()
}

proptest! {
    #[test]
    fn prop_waterfall_is_order_independent(
        room in 0i64..500,
        mak in 0i64..300,
        makala in 0i64..300,
        cuts in prop::collection::vec(0i64..2000, 0..6),
    ) {
        let total = room + mak + makala;
        prop_assume!(total > 0);

        let allocator = PaymentAllocator::new(Decimal::new(1, 3));
        let mut sheet = BalanceSheet {
            room_cost: Money::from_major(room),
            mak_charges: Money::from_major(mak),
            makala_charges: Money::from_major(makala),
            ..BalanceSheet::default()
        };
        let mut received = [Money::ZERO; 3];

        for part in partition(total, &cuts) {
            let amount = Money::from_major(part);
            let allocation = allocator.allocate(&sheet, amount);
            prop_assert_eq!(allocation.total(), amount);
            for (i, bucket) in Bucket::WATERFALL.iter().enumerate() {
                received[i] += allocation.to(*bucket);
            }
            sheet.paid += amount;
        }

        prop_assert_eq!(received[0], Money::from_major(room));
        prop_assert_eq!(received[1], Money::from_major(mak));
        prop_assert_eq!(received[2], Money::from_major(makala));
    }
}

#[derive(Debug, Clone)]
enum Op {
    Charge(u32),
    Pay(i64),
    Sale(i64, bool),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u32..4).prop_map(Op::Charge),
        (1i64..250).prop_map(Op::Pay),
        ((1i64..60), any::<bool>()).prop_map(|(amount, paid)| Op::Sale(amount, paid)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_paid_never_exceeds_debt(ops in prop::collection::vec(op(), 1..20)) {
        let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap()));
        let admin = Actor::admin("marta");
        let counter = Actor::counter("luis");
        let date = |d: u32| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();

        let mut desk = FrontDesk::new(DeskConfig::default(), NoopNotifier, EchoDocumentValidator).unwrap();
        let room_id = desk.add_room(&admin, NewRoom::new("101", 1, "doble", Money::from_major(99))).unwrap();
        let beer = desk.add_product(&admin, "Cerveza", Money::from_major(10), 1000, &time).unwrap();
        let reservation = desk
            .create_reservation(
                &counter,
                NewReservation::new(room_id, GuestDetails::new("Rosa Quispe", "1"), Stay::nights(date(1), date(3))),
                &time,
            )
            .unwrap();
        let id = reservation.id;
        desk.check_in(
            &counter,
            id,
            CheckInRequest {
                phone: "987654321".to_string(),
                email: "rosa@example.com".to_string(),
                photo: IdentityPhoto::new("dni.jpg", b"1".to_vec()),
            },
            &time,
        )
        .unwrap();

        for op in ops {
            // rejected operations are fine, they must just leave the invariant intact
            let _ = match op {
                Op::Charge(quantity) => desk
                    .add_consumption(&counter, id, vec![CartItem::new(beer, quantity)], None, &time)
                    .map(|_| ()),
                Op::Pay(amount) => desk
                    .add_payment(&counter, id, PaymentRequest::new(Money::from_major(amount), PaymentMethod::Cash), &time)
                    .map(|_| ()),
                Op::Sale(amount, paid) => {
                    let method = if paid { PaymentMethod::Yape } else { PaymentMethod::RoomCharge };
                    desk.record_sale(
                        &counter,
                        front_desk_rs::SaleRequest::flat(Money::from_major(amount), method).for_room(room_id),
                        &time,
                    )
                    .map(|_| ())
                }
            };

            let sheet = desk.store().balance(id).unwrap();
            prop_assert!(sheet.paid.as_decimal() <= sheet.total_debt().as_decimal() + Decimal::new(1, 1));
            prop_assert_eq!(sheet.paid, desk.store().ledger().payments_total(id));
        }
    }
}

fn quantity() -> impl Strategy<Value = u32> {
    prop_oneof![1u32..12, Just(u32::MAX), (u32::MAX - 16)..=u32::MAX, any::<u32>()]
}

proptest! {
    #[test]
    fn prop_withdraw_never_panics_and_is_all_or_nothing(
        cart in prop::collection::vec((0usize..3, quantity()), 1..5),
    ) {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap();
        let mut book = StockBook::new();
        let ids = [
            book.add_product("Agua", Money::from_major(3), 10, now).unwrap(),
            book.add_product("Cerveza", Money::from_major(8), 2, now).unwrap(),
            book.add_product("Jabón", Money::from_major(15), u32::MAX, now).unwrap(),
        ];
        let before: Vec<u32> = ids.iter().map(|id| book.product(*id).unwrap().stock).collect();

        let items: Vec<CartItem> = cart.iter().map(|(i, q)| CartItem::new(ids[*i], *q)).collect();
        let movements = book.movements().len();

        match book.withdraw(&items, "sale", now) {
            Ok(lines) => {
                prop_assert_eq!(lines.len(), items.len());
                for (i, id) in ids.iter().enumerate() {
                    let taken: u64 = cart.iter().filter(|(j, _)| *j == i).map(|(_, q)| u64::from(*q)).sum();
                    let after = u64::from(book.product(*id).unwrap().stock);
                    prop_assert_eq!(after + taken, u64::from(before[i]));
                }
                prop_assert_eq!(book.movements().len(), movements + items.len());
            }
            Err(_) => {
                for (i, id) in ids.iter().enumerate() {
                    prop_assert_eq!(book.product(*id).unwrap().stock, before[i]);
                }
                prop_assert_eq!(book.movements().len(), movements);
            }
        }
    }
}
