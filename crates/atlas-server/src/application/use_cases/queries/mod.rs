pub mod asset_forms;
pub mod browse_assets;

pub use asset_forms::AssetFormsUseCase;
pub use browse_assets::BrowseAssetsUseCase;
