//! Single-slot loading-arm connection between the FSRU and a carrier.
//!
//! At most one carrier activation may be discharging at any tick. The handle is an
//! explicit `Idle | Reserved(owner)` state with reserve and release operations.

use thiserror::Error;

/// Identifies one carrier activation.
pub type ActivationId = u64;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection already reserved by activation {owner}")]
    Busy { owner: ActivationId },

    #[error("activation {caller} cannot release a connection it does not hold")]
    NotOwner { caller: ActivationId },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Connection {
    #[default]
    Idle,
    Reserved(ActivationId),
}

impl Connection {
    pub fn is_idle(&self) -> bool {
        matches!(self, Connection::Idle)
    }

    pub fn owner(&self) -> Option<ActivationId> {
        match self {
            Connection::Idle => None,
            Connection::Reserved(owner) => Some(*owner),
        }
    }

    /// Reserve for `id`. Re-reserving by the current owner is a no-op.
    pub fn reserve(&mut self, id: ActivationId) -> Result<(), ConnectionError> {
        match *self {
            Connection::Idle => {
                *self = Connection::Reserved(id);
                Ok(())
            }
            Connection::Reserved(owner) if owner == id => Ok(()),
            Connection::Reserved(owner) => Err(ConnectionError::Busy { owner }),
        }
    }

    pub fn release(&mut self, id: ActivationId) -> Result<(), ConnectionError> {
        match *self {
            Connection::Reserved(owner) if owner == id => {
                *self = Connection::Idle;
                Ok(())
            }
            _ => Err(ConnectionError::NotOwner { caller: id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_and_release() {
        let mut conn = Connection::default();
        assert!(conn.is_idle());
        conn.reserve(1).unwrap();
        assert_eq!(conn.owner(), Some(1));
        conn.reserve(1).unwrap();
        conn.release(1).unwrap();
        assert!(conn.is_idle());
    }

    #[test]
    fn test_second_owner_is_refused() {
        let mut conn = Connection::default();
        conn.reserve(1).unwrap();
        assert_eq!(conn.reserve(2), Err(ConnectionError::Busy { owner: 1 }));
        assert_eq!(conn.release(2), Err(ConnectionError::NotOwner { caller: 2 }));
        assert_eq!(conn.owner(), Some(1));
    }

    #[test]
    fn test_release_when_idle_fails() {
        let mut conn = Connection::Idle;
        assert!(conn.release(7).is_err());
    }
}
