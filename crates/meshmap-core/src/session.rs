// ── Per-connection session state ──
//
// Owned by the dispatcher and handed to every handler explicitly. The local
// node number is the only mutable value shared between channels.

use tokio::sync::watch;

use crate::model::NodeNum;

/// Outcome of recording the local node number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityUpdate {
    /// First identity for this session.
    Set,
    /// The same number was reported again.
    Unchanged,
    /// A different number was reported; the first one is kept.
    Conflict { previous: NodeNum },
}

/// Session identity, written once per connection from MyNodeInfo.
#[derive(Debug)]
pub struct SessionState {
    my_node_num: watch::Sender<Option<NodeNum>>,
}

impl SessionState {
    pub fn new() -> Self {
        let (my_node_num, _) = watch::channel(None);
        Self { my_node_num }
    }

    /// Record the local node number. Only the first value sticks.
    pub fn set_identity(&self, num: NodeNum) -> IdentityUpdate {
        let mut outcome = IdentityUpdate::Set;
        self.my_node_num.send_if_modified(|current| match *current {
            None => {
                *current = Some(num);
                true
            }
            Some(existing) if existing == num => {
                outcome = IdentityUpdate::Unchanged;
                false
            }
            Some(previous) => {
                outcome = IdentityUpdate::Conflict { previous };
                false
            }
        });
        outcome
    }

    pub fn my_node_num(&self) -> Option<NodeNum> {
        *self.my_node_num.borrow()
    }

    /// Run `f` while holding the identity read guard.
    ///
    /// `set_identity` cannot complete while `f` runs, so anything `f`
    /// records is either visible to a later reclassification or already
    /// saw the identity.
    pub fn with_identity<R>(&self, f: impl FnOnce(Option<NodeNum>) -> R) -> R {
        let guard = self.my_node_num.borrow();
        f(*guard)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NodeNum>> {
        self.my_node_num.subscribe()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_set_once() {
        let session = SessionState::new();
        assert_eq!(session.my_node_num(), None);

        assert_eq!(session.set_identity(NodeNum(7)), IdentityUpdate::Set);
        assert_eq!(session.set_identity(NodeNum(7)), IdentityUpdate::Unchanged);
        assert_eq!(
            session.set_identity(NodeNum(8)),
            IdentityUpdate::Conflict {
                previous: NodeNum(7)
            }
        );
        assert_eq!(session.my_node_num(), Some(NodeNum(7)));
    }

    #[test]
    fn with_identity_sees_current_value() {
        let session = SessionState::new();
        assert!(session.with_identity(|me| me.is_none()));
        session.set_identity(NodeNum(3));
        assert_eq!(session.with_identity(|me| me), Some(NodeNum(3)));
    }

    #[tokio::test]
    async fn subscribers_observe_identity() {
        let session = SessionState::new();
        let mut rx = session.subscribe();
        session.set_identity(NodeNum(42));
        assert!(rx.changed().await.is_ok());
        assert_eq!(*rx.borrow(), Some(NodeNum(42)));
    }
}
