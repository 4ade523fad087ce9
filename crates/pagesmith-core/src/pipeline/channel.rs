//! Bounded work queue between the collector and the workers.

use super::work::WorkMessage;

/// Sending half of the work queue.
pub type WorkSender = flume::Sender<WorkMessage>;

/// Receiving half of the work queue, cloned into every worker.
pub type WorkReceiver = flume::Receiver<WorkMessage>;

/// Create the work queue with room for `capacity` pending messages.
///
/// When the buffer is full, the collector blocks, so listing a huge source
/// never holds more than `capacity` work items in memory.
pub fn work_queue(capacity: usize) -> (WorkSender, WorkReceiver) {
    flume::bounded(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_bounded_fifo() {
        let (tx, rx) = work_queue(2);
        tx.send(WorkMessage::Quit).unwrap();
        tx.send(WorkMessage::Quit).unwrap();
        assert!(matches!(
            tx.try_send(WorkMessage::Quit),
            Err(flume::TrySendError::Full(_))
        ));

        assert!(matches!(rx.recv(), Ok(WorkMessage::Quit)));
        assert!(tx.try_send(WorkMessage::Quit).is_ok());
    }
}
