use crate::ScannerError;

/// An item delivered on a subscription stream: one decoded event or a phase change.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerMessage<T: Clone> {
    Data(T),
    Notification(Notification),
}

/// Phase changes and recoveries announced on subscription streams.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The backfill window contained no decodable events.
    NoPastEventsFound,
    /// Backfill finished and the live subscription is open.
    SwitchingToLive,
    /// The live subscription was re-established after a failure.
    Resubscribed,
}

impl<T: Clone> ScannerMessage<T> {
    /// The carried event, if this is a data item.
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            ScannerMessage::Data(data) => Some(data),
            ScannerMessage::Notification(_) => None,
        }
    }

    #[must_use]
    pub fn notification(&self) -> Option<Notification> {
        match self {
            ScannerMessage::Notification(notification) => Some(*notification),
            ScannerMessage::Data(_) => None,
        }
    }
}

impl<T: Clone> From<Notification> for ScannerMessage<T> {
    fn from(notification: Notification) -> Self {
        ScannerMessage::Notification(notification)
    }
}

impl<T: Clone> PartialEq<Notification> for ScannerMessage<T> {
    fn eq(&self, other: &Notification) -> bool {
        self.notification().is_some_and(|notification| notification == *other)
    }
}

/// What subscription streams yield. `Err` items are non-terminal.
pub type ScannerResult<T> = Result<ScannerMessage<T>, ScannerError>;
