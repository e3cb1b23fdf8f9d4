use crate::source::SourceConnection;
use std::ops::{Deref, DerefMut};

/// Owns a source connection and disconnects it when dropped, whichever way the session ends.
pub struct ConnectionGuard<C: SourceConnection> {
    connection: C,
}

impl<C: SourceConnection> ConnectionGuard<C> {
    pub fn new(connection: C) -> Self {
        Self { connection }
    }
}

impl<C: SourceConnection> Deref for ConnectionGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C: SourceConnection> DerefMut for ConnectionGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}

impl<C: SourceConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}
