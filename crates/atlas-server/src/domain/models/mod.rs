pub mod asset;
pub mod catalog;
pub mod node;
pub mod protocol;

pub use asset::{Asset, AssetDraft, AssetPatch, AssetSummary, Platform};
pub use catalog::{AdminUser, Domain, Label, SystemUser};
pub use node::Node;
pub use protocol::{Protocol, ProtocolName};
