use factcheck_core::{AccumulatedState, Badge, CommandAck, CoordinatorEvent, Notification};

/// Events flowing from the coordinator side into the UI loop.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// A state broadcast from the coordinator.
    Coordinator(CoordinatorEvent),
    /// The broadcast receiver fell behind; this is a fresh state read.
    Resync(AccumulatedState),
    Badge(Badge),
    Notification(Notification),
    /// Reply to a command sent from the UI.
    Ack(CommandAck),
}
