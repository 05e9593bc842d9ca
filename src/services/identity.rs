use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ConversationRef;

/// Namespace for deriving conversation ids from participant pairs.
const CONVERSATION_NAMESPACE: Uuid = Uuid::from_u128(0x8f2e_61d4_9b3a_4c07_a5e1_27c8_d90f_b654);

/// Deterministic mapping from an unordered user pair to the canonical
/// conversation identity.
pub struct ConversationIdentity;

impl ConversationIdentity {
    /// Pure function of the pair: both directions of a concurrent
    /// first-contact send compute the same id, so the catalog's
    /// create-if-absent is the only race that matters.
    pub fn resolve(user_a: Uuid, user_b: Uuid) -> AppResult<ConversationRef> {
        if user_a == user_b {
            return Err(AppError::InvalidParticipants);
        }
        let (low, high) = if user_a < user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };
        let id = Uuid::new_v5(&CONVERSATION_NAMESPACE, format!("{low}:{high}").as_bytes());
        Ok(ConversationRef {
            id,
            low_user_id: low,
            high_user_id: high,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn is_symmetric() {
        let ab = ConversationIdentity::resolve(uid(5), uid(9)).unwrap();
        let ba = ConversationIdentity::resolve(uid(9), uid(5)).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.low_user_id, uid(5));
        assert_eq!(ab.high_user_id, uid(9));
    }

    #[test]
    fn rejects_self_conversation() {
        assert!(matches!(
            ConversationIdentity::resolve(uid(7), uid(7)),
            Err(AppError::InvalidParticipants)
        ));
    }

    #[test]
    fn distinct_pairs_get_distinct_ids() {
        let a = ConversationIdentity::resolve(uid(1), uid(2)).unwrap();
        let b = ConversationIdentity::resolve(uid(1), uid(3)).unwrap();
        let c = ConversationIdentity::resolve(uid(2), uid(3)).unwrap();
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_ne!(b.id, c.id);
    }
}
