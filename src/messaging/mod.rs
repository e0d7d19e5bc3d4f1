/// Message passing between the form layer and its observers
///
/// The wizard never reaches into shared mutable form state: the store
/// publishes snapshots here and the wizard drains its own subscription.
pub mod bus;
pub mod events;

pub use bus::{FormBus, SubscriberId};
pub use events::FormEvent;
