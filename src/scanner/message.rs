use crate::{BindReferralEvent, ScannerMessage};

/// Successful item of a subscription stream.
pub type Message = ScannerMessage<BindReferralEvent>;

impl From<BindReferralEvent> for Message {
    fn from(event: BindReferralEvent) -> Self {
        Message::Data(event)
    }
}

impl PartialEq<BindReferralEvent> for Message {
    fn eq(&self, other: &BindReferralEvent) -> bool {
        matches!(self, Message::Data(event) if event == other)
    }
}

impl PartialEq<&BindReferralEvent> for Message {
    fn eq(&self, other: &&BindReferralEvent) -> bool {
        self.eq(*other)
    }
}
