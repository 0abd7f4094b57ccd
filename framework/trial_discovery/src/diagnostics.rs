//! Discovery-time diagnostics.
//!
//! Problems that should not stop discovery are logged and, when a bus is
//! attached, published as [`Message::Diagnostic`].

use std::any::Any;

use trial_ir::UniqueId;
use trial_messages::{Correlation, Message, MessageBus};

#[derive(Clone, Copy, Debug)]
pub struct Diagnostics<'a> {
    bus: Option<&'a MessageBus>,
    assembly_id: &'a UniqueId,
}

impl<'a> Diagnostics<'a> {
    pub fn new(bus: Option<&'a MessageBus>, assembly_id: &'a UniqueId) -> Self {
        Diagnostics { bus, assembly_id }
    }

    #[cold]
    pub fn report(&self, message: String) {
        tracing::warn!(target: "trial::discovery", "{message}");
        if let Some(bus) = self.bus {
            bus.publish(&Message::Diagnostic {
                ids: Correlation::assembly(self.assembly_id),
                message,
            });
        }
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}
