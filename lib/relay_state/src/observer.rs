use transport::DeviceId;

use crate::Error;

/// Hooks through which the engine talks to whatever presents its state.
pub trait Observer: Send + Sync {
    /// Called after every store mutation of `device_id`, once the mutation is
    /// fully applied and the store is unlocked.
    fn state_changed(&self, device_id: &DeviceId);

    /// Called for every failed poll. The schedule keeps running.
    fn poll_failed(&self, poller: &str, error: &Error) {
        let _ = (poller, error);
    }
}
