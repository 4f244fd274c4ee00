pub mod batch_repo;
pub mod campaign_repo;
pub mod conversation_repo;
pub mod invitation_repo;
pub mod message_repo;
pub mod recipient_repo;

pub use batch_repo::BatchRepo;
pub use campaign_repo::CampaignRepo;
pub use conversation_repo::ConversationRepo;
pub use invitation_repo::InvitationRepo;
pub use message_repo::MessageRepo;
pub use recipient_repo::RecipientRepo;
