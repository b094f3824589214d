pub mod assets;
pub mod cache;

pub use assets::{AssetError, AssetSource, AssetState, ImageCache, StaticAssets, decode_source};
pub use cache::{Atom, get_source, intern_source, source_count};
