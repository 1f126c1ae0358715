pub mod bulk_update_assets;
pub mod create_asset;
pub mod delete_asset;
pub mod manage_catalog;
pub mod manage_grants;
pub mod save_selection;
pub mod update_asset;

pub use bulk_update_assets::BulkUpdateAssetsUseCase;
pub use create_asset::CreateAssetUseCase;
pub use delete_asset::DeleteAssetUseCase;
pub use manage_catalog::ManageCatalogUseCase;
pub use manage_grants::ManageGrantsUseCase;
pub use save_selection::SaveSelectionUseCase;
pub use update_asset::UpdateAssetUseCase;
