use crate::store::SharedStore;

/// Runs store-backed requests (`GetEventById`, `PutEvent`, …) through
/// [`kanau::processor::Processor`].
#[derive(Clone)]
pub struct StoreProcessor {
    pub store: SharedStore,
}

impl StoreProcessor {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}
