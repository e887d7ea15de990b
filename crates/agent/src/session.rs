use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use cutquote_core::domain::session::{ContactId, Session};

type Slot = Arc<Mutex<Option<Session>>>;

/// Exclusive access to one contact's session record. `None` means no conversation is open.
pub type SessionGuard = OwnedMutexGuard<Option<Session>>;

/// Per-contact session records. Every read and write of one contact's session happens under
/// that contact's mutex; the outer map lock is only held to find or create the slot.
#[derive(Default)]
pub struct SessionStore {
    slots: RwLock<HashMap<ContactId, Slot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, contact: &ContactId) -> Slot {
        if let Some(slot) = self.slots.read().await.get(contact) {
            return slot.clone();
        }
        self.slots.write().await.entry(contact.clone()).or_default().clone()
    }

    /// Locks the contact's record, waiting for any turn or sweep already holding it.
    pub async fn lock(&self, contact: &ContactId) -> SessionGuard {
        self.slot(contact).await.lock_owned().await
    }

    pub async fn get(&self, contact: &ContactId) -> Option<Session> {
        let slot = self.slots.read().await.get(contact).cloned()?;
        let session = slot.lock().await;
        session.clone()
    }

    /// Runs `mutator` on the record while holding the contact's lock.
    pub async fn upsert<F, R>(&self, contact: &ContactId, mutator: F) -> R
    where
        F: FnOnce(&mut Option<Session>) -> R,
    {
        let mut guard = self.lock(contact).await;
        mutator(&mut *guard)
    }

    /// Removes the contact's session and returns it.
    pub async fn clear(&self, contact: &ContactId) -> Option<Session> {
        let slot = self.slots.read().await.get(contact).cloned()?;
        let mut session = slot.lock().await;
        session.take()
    }

    /// Contacts with a slot, sorted. Some of them may have no open session.
    pub async fn contacts(&self) -> Vec<ContactId> {
        let mut contacts: Vec<ContactId> = self.slots.read().await.keys().cloned().collect();
        contacts.sort();
        contacts
    }

    pub async fn open_sessions(&self) -> usize {
        let slots: Vec<Slot> = self.slots.read().await.values().cloned().collect();
        let mut open = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                open += 1;
            }
        }
        open
    }

    /// Drops empty slots nobody else holds. A slot can only be cloned under the map lock, so a
    /// strong count of one under the write lock means no turn is using it.
    pub async fn prune(&self) -> usize {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(session) => session.is_some(),
                Err(_) => true,
            }
        });
        before - slots.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use cutquote_core::domain::customer::{Customer, CustomerId};
    use cutquote_core::domain::session::{ContactId, Session};
    use cutquote_core::flows::DialogueState;

    use super::SessionStore;

    fn session(contact: &ContactId) -> Session {
        Session::new(
            contact.clone(),
            Customer {
                id: CustomerId("C-1".to_string()),
                name: "Ana".to_string(),
                contact: contact.0.clone(),
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn upsert_get_and_clear() {
        let store = SessionStore::new();
        let contact = ContactId::from("5511999990000");

        assert!(store.get(&contact).await.is_none());
        store.upsert(&contact, |slot| *slot = Some(session(&contact))).await;
        store
            .upsert(&contact, |slot| {
                if let Some(session) = slot.as_mut() {
                    session.enter(DialogueState::AwaitingHeight);
                }
            })
            .await;

        let stored = store.get(&contact).await.expect("session stored");
        assert_eq!(stored.state(), DialogueState::AwaitingHeight);

        assert!(store.clear(&contact).await.is_some());
        assert!(store.get(&contact).await.is_none());
        assert_eq!(store.open_sessions().await, 0);
    }

    #[tokio::test]
    async fn concurrent_mutations_on_one_contact_are_not_lost() {
        let store = Arc::new(SessionStore::new());
        let contact = ContactId::from("5511999990000");
        store.upsert(&contact, |slot| *slot = Some(session(&contact))).await;

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let contact = contact.clone();
            tasks.push(tokio::spawn(async move {
                let mut guard = store.lock(&contact).await;
                let session = (*guard).as_mut().expect("session present");
                let height = session.answers.height_mm.unwrap_or(0);
                tokio::task::yield_now().await;
                session.answers.height_mm = Some(height + 1);
            }));
        }
        for task in tasks {
            task.await.expect("task completes");
        }

        let stored = store.get(&contact).await.expect("session stored");
        assert_eq!(stored.answers.height_mm, Some(32));
    }

    #[tokio::test]
    async fn prune_keeps_open_and_locked_slots() {
        let store = SessionStore::new();
        let open = ContactId::from("111");
        let closed = ContactId::from("222");
        let busy = ContactId::from("333");

        store.upsert(&open, |slot| *slot = Some(session(&open))).await;
        store.upsert(&closed, |slot| *slot = None).await;
        let guard = store.lock(&busy).await;

        assert_eq!(store.prune().await, 1);
        assert_eq!(store.contacts().await, vec![open, busy]);
        drop(guard);
        assert_eq!(store.prune().await, 1);
    }
}
