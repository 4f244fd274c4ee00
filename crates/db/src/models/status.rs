//! Status helper enums mapping to SMALLINT columns.
//!
//! Each enum variant's discriminant matches the 1-based seed order
//! documented in the schema migration.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Message direction relative to the platform.
    Direction {
        Inbound = 1,
        Outbound = 2,
    }
}

define_status_enum! {
    /// Delivery lifecycle of an outbound message.
    ///
    /// Ids double as the monotonic rank: a status update only applies
    /// when its id is greater than the stored one, so `read` can never
    /// regress to `delivered` and `failed` (the maximum) is terminal.
    MessageStatus {
        Queued = 1,
        Sent = 2,
        Delivered = 3,
        Read = 4,
        Failed = 5,
    }
}

define_status_enum! {
    /// Campaign lifecycle status.
    CampaignStatus {
        Draft = 1,
        Sending = 2,
        Completed = 3,
        Failed = 4,
    }
}

define_status_enum! {
    /// Per-recipient delivery status within a campaign.
    RecipientStatus {
        Pending = 1,
        Sent = 2,
        Failed = 3,
    }
}

define_status_enum! {
    /// Guest attendance response on an invitation.
    RsvpStatus {
        Pending = 1,
        Accepted = 2,
        Declined = 3,
    }
}

define_status_enum! {
    /// Card-generation job status.
    CardJobStatus {
        Pending = 1,
        Processing = 2,
        Completed = 3,
        Failed = 4,
    }
}

impl MessageStatus {
    /// Parse the provider's wire status string.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(MessageStatus::Sent),
            "delivered" => Some(MessageStatus::Delivered),
            "read" => Some(MessageStatus::Read),
            "failed" => Some(MessageStatus::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_status_ids_are_monotonic_ranks() {
        assert!(MessageStatus::Queued.id() < MessageStatus::Sent.id());
        assert!(MessageStatus::Sent.id() < MessageStatus::Delivered.id());
        assert!(MessageStatus::Delivered.id() < MessageStatus::Read.id());
        assert!(MessageStatus::Read.id() < MessageStatus::Failed.id());
    }

    #[test]
    fn campaign_status_ids_match_seed_data() {
        assert_eq!(CampaignStatus::Draft.id(), 1);
        assert_eq!(CampaignStatus::Sending.id(), 2);
        assert_eq!(CampaignStatus::Completed.id(), 3);
        assert_eq!(CampaignStatus::Failed.id(), 4);
    }

    #[test]
    fn wire_statuses_parse() {
        assert_eq!(MessageStatus::from_wire("sent"), Some(MessageStatus::Sent));
        assert_eq!(MessageStatus::from_wire("read"), Some(MessageStatus::Read));
        assert_eq!(MessageStatus::from_wire("unknown"), None);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = RsvpStatus::Accepted.into();
        assert_eq!(id, 2);
    }
}
