// 基本的なデータ型と数学ユーティリティ
pub mod common;

// エンティティ種別と性能表
pub mod kind;

// エンティティの基本インターフェース（trait）定義
pub mod traits;

// ファイル転送レコード
pub mod file;

// 各エンティティモデルの実装
pub mod device;
pub mod satellite;

// 可視性・距離判定
pub mod geometry;

// レポート出力用の情報
pub mod info;

// 便利な re-export
pub use common::*;
pub use device::Device;
pub use file::{FileRecord, FileStore};
pub use info::{EntityInfo, FileInfo};
pub use kind::{Capacity, EntityKind};
pub use satellite::Satellite;
pub use traits::*;
