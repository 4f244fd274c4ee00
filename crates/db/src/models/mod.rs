pub mod campaign;
pub mod card;
pub mod conversation;
pub mod invitation;
pub mod message;
pub mod recipient;
pub mod status;
