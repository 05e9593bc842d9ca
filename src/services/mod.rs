pub mod catalog;
pub mod coordinator;
pub mod directory;
pub mod identity;
pub mod message_store;

pub use catalog::ConversationCatalog;
pub use coordinator::{FanoutReport, FanoutView, SendOutcome, WriteCoordinator};
pub use directory::ConversationDirectory;
pub use identity::ConversationIdentity;
pub use message_store::MessageStore;
