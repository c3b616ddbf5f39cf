//! User inbox and outbound SMS/email dispatch.

use super::{Outbound, Portal, required};
use crate::error::Result;
use crate::model::{Channel, Notification, NotificationKind, User};
use crate::primitives::MAX_NAME_LEN;
use crate::storage::{Batch, StoreExt};
use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Admin "send notification" form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendNotification {
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    /// Web delivery always happens; listing `web` is optional.
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// What happened to a sent notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub notification: Notification,
    pub sms_sent: bool,
    pub email_sent: bool,
}

impl Portal {
    /// Every notification of a user, newest first.
    pub fn notifications_newest_first(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let mut inbox = self
            .store
            .fetch_where(|n: &Notification| n.user_id == user_id)?;
        inbox.sort_by(|a, b| {
            b.date_created
                .cmp(&a.date_created)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(inbox)
    }

    /// The `limit` newest notifications, left unread.
    pub fn recent_notifications(&self, user_id: UserId, limit: usize) -> Result<Vec<Notification>> {
        let mut inbox = self.notifications_newest_first(user_id)?;
        inbox.truncate(limit);
        Ok(inbox)
    }

    /// The notifications page: everything, newest first, marked read.
    pub fn notifications_page(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let mut inbox = self.notifications_newest_first(user_id)?;
        let mut batch = Batch::new();
        for notification in inbox.iter_mut().filter(|n| !n.is_read) {
            notification.is_read = true;
            batch.put(&*notification)?;
        }
        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        Ok(inbox)
    }

    /// Store a web notification and push it through the requested channels.
    ///
    /// The inbox row is committed first; `date_sent` is stamped afterwards
    /// when a channel accepted the message. SMS is skipped for users
    /// without a phone number.
    pub fn send_notification(&self, input: SendNotification, now: DateTime<Utc>) -> Result<Delivery> {
        let title = required("title", &input.title, MAX_NAME_LEN * 2)?;
        let message = required("message", &input.message, 2000)?;
        let user = self.require::<User>("user", input.user_id.0)?;

        let mut notification =
            self.notification(user.id, &title, &message, NotificationKind::Info, now)?;
        let mut batch = Batch::new();
        batch.put(&notification)?;
        self.store.commit(batch)?;

        // The inbox row is stored before anything leaves the portal.
        let mut sms_sent = false;
        let mut email_sent = false;
        if input.channels.contains(&Channel::Sms) && !user.phone.is_empty() {
            sms_sent = self.dispatcher.dispatch(&Outbound::Sms {
                phone: user.phone.clone(),
                text: format!("{title}: {message}"),
            });
        }
        if input.channels.contains(&Channel::Email) {
            email_sent = self.dispatcher.dispatch(&Outbound::Email {
                to: user.email.clone(),
                subject: title,
                body: message,
            });
        }
        if sms_sent || email_sent {
            notification.date_sent = Some(now);
            let mut batch = Batch::new();
            batch.put(&notification)?;
            self.store.commit(batch)?;
        }
        Ok(Delivery {
            notification,
            sms_sent,
            email_sent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PortalError;
    use crate::portal::Dispatcher;
    use crate::portal::testing::{new_user, portal, t0};
    use chrono::Duration;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Outbound>>);

    impl Dispatcher for Recorder {
        fn dispatch(&self, message: &Outbound) -> bool {
            self.0.lock().expect("lock").push(message.clone());
            true
        }
    }

    fn send(user_id: UserId, title: &str, channels: Vec<Channel>) -> SendNotification {
        SendNotification {
            user_id,
            title: title.into(),
            message: "तपासणी पूर्ण".into(),
            channels,
        }
    }

    #[test]
    fn page_marks_read_but_api_does_not() {
        let p = portal();
        let user = p.register(new_user("rahul"), t0()).expect("register");
        p.send_notification(send(user.id, "one", vec![]), t0() + Duration::minutes(1))
            .expect("send");

        let api = p.recent_notifications(user.id, 20).expect("api");
        assert_eq!(api.len(), 2);
        assert_eq!(api[0].title, "one");
        assert!(api.iter().all(|n| !n.is_read));

        let page = p.notifications_page(user.id).expect("page");
        assert!(page.iter().all(|n| n.is_read));
        assert!(p.recent_notifications(user.id, 20).expect("api").iter().all(|n| n.is_read));
    }

    #[test]
    fn recent_is_limited_and_newest_first() {
        let p = portal();
        let user = p.register(new_user("rahul"), t0()).expect("register");
        for i in 1..=25 {
            p.send_notification(send(user.id, &format!("n{i}"), vec![]), t0() + Duration::minutes(i))
                .expect("send");
        }
        let api = p.recent_notifications(user.id, 20).expect("api");
        assert_eq!(api.len(), 20);
        assert_eq!(api[0].title, "n25");
        assert_eq!(api[19].title, "n6");
    }

    #[test]
    fn channels_go_through_dispatcher() {
        let recorder = Arc::new(Recorder::default());
        let p = portal().with_dispatcher(recorder.clone());
        let user = p.register(new_user("rahul"), t0()).expect("register");

        let delivery = p
            .send_notification(send(user.id, "सूचना", vec![Channel::Sms, Channel::Email]), t0())
            .expect("send");
        assert!(delivery.sms_sent && delivery.email_sent);
        assert_eq!(delivery.notification.date_sent, Some(t0()));
        assert_eq!(delivery.notification.channel, Channel::Web);

        let sent = recorder.0.lock().expect("lock");
        assert_eq!(sent.len(), 2);
        assert!(matches!(&sent[0], Outbound::Sms { text, .. } if text.starts_with("सूचना: ")));
    }

    #[test]
    fn sms_skipped_without_phone() {
        let recorder = Arc::new(Recorder::default());
        let p = portal().with_dispatcher(recorder.clone());
        let mut form = new_user("nophone");
        form.phone = String::new();
        let user = p.register(form, t0()).expect("register");

        let delivery = p
            .send_notification(send(user.id, "t", vec![Channel::Sms]), t0())
            .expect("send");
        assert!(!delivery.sms_sent);
        assert!(recorder.0.lock().expect("lock").is_empty());
    }

    #[test]
    fn unknown_user_is_not_found() {
        let p = portal();
        assert!(matches!(
            p.send_notification(send(UserId(404), "t", vec![]), t0()),
            Err(PortalError::NotFound { entity: "user", .. })
        ));
    }

    #[test]
    fn inbox_row_exists_before_dispatch() {
        use crate::auth::HashCost;
        use crate::portal::PortalOptions;
        use crate::storage::{MemoryStore, Store};

        /// Counts stored notifications at the moment each message leaves.
        struct InboxWitness {
            store: Arc<MemoryStore>,
            seen: Mutex<Vec<usize>>,
        }

        impl Dispatcher for InboxWitness {
            fn dispatch(&self, _message: &Outbound) -> bool {
                let rows = self
                    .store
                    .fetch_where(|n: &Notification| n.title == "तपासणी")
                    .expect("scan");
                self.seen.lock().expect("lock").push(rows.len());
                true
            }
        }

        let store = Arc::new(MemoryStore::new());
        let witness = Arc::new(InboxWitness {
            store: store.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let options = PortalOptions {
            hash_cost: HashCost::Low,
            ..PortalOptions::default()
        };
        let shared: Arc<dyn Store> = store.clone();
        let p = Portal::with_seed(shared, options, 3).with_dispatcher(witness.clone());
        let user = p.register(new_user("rahul"), t0()).expect("register");

        let delivery = p
            .send_notification(send(user.id, "तपासणी", vec![Channel::Sms, Channel::Email]), t0())
            .expect("send");
        assert_eq!(*witness.seen.lock().expect("lock"), vec![1, 1]);

        let stored: Option<Notification> = store.fetch(delivery.notification.id.0).expect("get");
        assert_eq!(stored.and_then(|n| n.date_sent), Some(t0()));
    }
}
