//! Email bodies for the notifications the workflows enqueue.

use std::sync::LazyLock;

use anyhow::anyhow;
use handlebars::Handlebars;
use serde::Serialize;

use crate::{
    entity::bookings,
    error::{AppError, AppResult},
};

pub const KIND_TUTOR_APPROVED: &str = "tutor_approved";
pub const KIND_TUTOR_REJECTED: &str = "tutor_rejected";
pub const KIND_BOOKING_PAID: &str = "booking_paid";

const TUTOR_APPROVED_HTML: &str = "<h2>Selamat, {{name}}!</h2>\
    <p>Profil tutor Anda telah disetujui dan sekarang tampil di pencarian LesGo.</p>\
    <p><a href=\"{{dashboard_url}}\">Buka dashboard tutor</a></p>";

const TUTOR_REJECTED_HTML: &str = "<h2>Halo, {{name}}</h2>\
    <p>Mohon maaf, pengajuan profil tutor Anda belum dapat disetujui.</p>\
    {{#if reason}}<p>Catatan dari admin: {{reason}}</p>{{/if}}\
    <p>Silakan perbarui data Anda dan ajukan kembali.</p>";

const BOOKING_PAID_HTML: &str = "<h2>Booking baru, {{tutor}}!</h2>\
    <p>{{parent}} telah membayar sesi les berikut:</p>\
    <ul>\
    <li>Mata pelajaran: {{subject}}</li>\
    <li>Tanggal: {{date}} pukul {{time}}</li>\
    <li>Durasi: {{hours}} jam</li>\
    <li>Alamat: {{address}}</li>\
    <li>Pendapatan Anda: {{earnings}}</li>\
    </ul>\
    <p>Silakan konfirmasi atau tolak booking ini dari dashboard.</p>";

static REGISTRY: LazyLock<Result<Handlebars<'static>, String>> = LazyLock::new(|| {
    let mut handlebars = Handlebars::new();
    for (name, source) in [
        (KIND_TUTOR_APPROVED, TUTOR_APPROVED_HTML),
        (KIND_TUTOR_REJECTED, TUTOR_REJECTED_HTML),
        (KIND_BOOKING_PAID, BOOKING_PAID_HTML),
    ] {
        handlebars
            .register_template_string(name, source)
            .map_err(|e| format!("template {name}: {e}"))?;
    }
    Ok(handlebars)
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: &'static str,
    pub recipient: String,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct TutorApproved<'a> {
    name: &'a str,
    dashboard_url: String,
}

#[derive(Serialize)]
struct TutorRejected<'a> {
    name: &'a str,
    reason: Option<&'a str>,
}

#[derive(Serialize)]
struct BookingPaid<'a> {
    tutor: &'a str,
    parent: &'a str,
    subject: &'a str,
    date: String,
    time: String,
    hours: i32,
    address: &'a str,
    earnings: String,
}

fn render<T: Serialize>(kind: &'static str, data: &T) -> AppResult<String> {
    let registry = REGISTRY
        .as_ref()
        .map_err(|e| AppError::Internal(anyhow!("template registry: {e}")))?;
    registry
        .render(kind, data)
        .map_err(|e| AppError::Internal(anyhow!("rendering {kind}: {e}")))
}

pub fn tutor_approved(name: &str, email: &str, base_url: &str) -> AppResult<NotificationDraft> {
    let html = render(
        KIND_TUTOR_APPROVED,
        &TutorApproved {
            name,
            dashboard_url: format!("{}/tutor/dashboard", base_url.trim_end_matches('/')),
        },
    )?;
    Ok(NotificationDraft {
        kind: KIND_TUTOR_APPROVED,
        recipient: email.to_string(),
        subject: "Profil tutor Anda telah disetujui".into(),
        html,
    })
}

pub fn tutor_rejected(name: &str, email: &str, reason: Option<&str>) -> AppResult<NotificationDraft> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    let html = render(KIND_TUTOR_REJECTED, &TutorRejected { name, reason })?;
    Ok(NotificationDraft {
        kind: KIND_TUTOR_REJECTED,
        recipient: email.to_string(),
        subject: "Pengajuan profil tutor Anda ditolak".into(),
        html,
    })
}

pub fn booking_paid(
    tutor_name: &str,
    tutor_email: &str,
    parent_name: &str,
    booking: &bookings::Model,
) -> AppResult<NotificationDraft> {
    let html = render(
        KIND_BOOKING_PAID,
        &BookingPaid {
            tutor: tutor_name,
            parent: parent_name,
            subject: &booking.subject,
            date: booking.session_date.format("%d-%m-%Y").to_string(),
            time: booking.session_time.format("%H:%M").to_string(),
            hours: booking.duration_hours,
            address: &booking.address,
            earnings: rupiah(booking.tutor_earnings),
        },
    )?;
    Ok(NotificationDraft {
        kind: KIND_BOOKING_PAID,
        recipient: tutor_email.to_string(),
        subject: format!("Booking baru: {}", booking.subject),
        html,
    })
}

/// `150000` -> `Rp 150.000`
pub fn rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}Rp {grouped}")
}
