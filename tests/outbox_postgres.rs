mod common;

use lesgo_api::{
    entity::notification_outbox::{self, OutboxStatus},
    services::notification_service,
    templates::{KIND_TUTOR_APPROVED, NotificationDraft},
};
use sea_orm::EntityTrait;

use common::postgres;

// The after-commit sender and the polling worker race for the same fresh row.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_deliver_each_row_once() -> anyhow::Result<()> {
    let Some(h) = postgres().await? else {
        return Ok(());
    };

    let mut ids = Vec::new();
    for n in 0..10 {
        let draft = NotificationDraft {
            kind: KIND_TUTOR_APPROVED,
            recipient: format!("tutor{n}@example.com"),
            subject: "Profil tutor Anda telah disetujui".into(),
            html: "<p>Selamat!</p>".into(),
        };
        ids.push(notification_service::enqueue(h.state.db(), draft).await?);
    }

    let mut senders = Vec::new();
    for id in ids.clone() {
        let state = h.state.clone();
        senders.push(tokio::spawn(async move {
            notification_service::dispatch_one(&state, id).await
        }));
    }
    for _ in 0..2 {
        let state = h.state.clone();
        senders.push(tokio::spawn(async move {
            notification_service::dispatch_pending(&state).await.map(|r| r.sent > 0)
        }));
    }
    for sender in senders {
        sender.await??;
    }

    let sent = h.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), ids.len());
    let mut recipients: Vec<_> = sent.iter().map(|m| m.to.clone()).collect();
    recipients.sort();
    recipients.dedup();
    assert_eq!(recipients.len(), ids.len());

    for id in ids {
        let row = notification_outbox::Entity::find_by_id(id)
            .one(h.state.db())
            .await?
            .unwrap();
        assert_eq!(row.status, OutboxStatus::Sent);
        assert_eq!(row.attempts, 1);
        assert!(row.claimed_until.is_none());
    }

    Ok(())
}
