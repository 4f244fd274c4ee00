pub mod campaigns;
pub mod cards;
pub mod conversations;
pub mod flow;
pub mod invitations;
pub mod webhook;
