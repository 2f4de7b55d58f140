mod common;

use lesgo_api::{entity::bookings::BookingStatus, templates};
use uuid::Uuid;

use common::booking;

#[test]
fn markup_in_user_supplied_names_is_escaped() {
    let draft = templates::tutor_approved(
        "<script>alert(1)</script>",
        "budi@example.com",
        "https://lesgo.id/",
    )
    .unwrap();

    assert_eq!(draft.kind, templates::KIND_TUTOR_APPROVED);
    assert_eq!(draft.recipient, "budi@example.com");
    assert!(draft.html.contains("&lt;script&gt;"));
    assert!(!draft.html.contains("<script>"));
    assert!(draft.html.contains("https://lesgo.id/tutor/dashboard"));
}

#[test]
fn rejection_note_only_appears_when_given() {
    let with_reason =
        templates::tutor_rejected("Budi", "budi@example.com", Some("Foto KTP <buram>")).unwrap();
    assert!(with_reason.html.contains("Catatan dari admin: Foto KTP &lt;buram&gt;"));

    let blank = templates::tutor_rejected("Budi", "budi@example.com", Some("   ")).unwrap();
    assert!(!blank.html.contains("Catatan dari admin"));

    let missing = templates::tutor_rejected("Budi", "budi@example.com", None).unwrap();
    assert!(!missing.html.contains("Catatan dari admin"));
    assert!(missing.html.contains("Halo, Budi"));
}

#[test]
fn paid_booking_email_lists_the_session() {
    let paid = booking(Uuid::new_v4(), Uuid::new_v4(), BookingStatus::Paid);
    let draft =
        templates::booking_paid("Sari", "sari@example.com", "Ibu Rina & Keluarga", &paid).unwrap();

    assert_eq!(draft.kind, templates::KIND_BOOKING_PAID);
    assert_eq!(draft.subject, "Booking baru: Matematika");
    assert!(draft.html.contains("Ibu Rina &amp; Keluarga"));
    assert!(draft.html.contains("Tanggal: 14-03-2099 pukul 15:00"));
    assert!(draft.html.contains("Durasi: 2 jam"));
    assert!(draft.html.contains("Pendapatan Anda: Rp 127.500"));
}
