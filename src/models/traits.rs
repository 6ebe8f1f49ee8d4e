use crate::models::common::Angle;
use crate::models::file::FileStore;
use crate::models::kind::{Capacity, EntityKind};

/// デバイスと衛星に共通するエンティティのインターフェース
pub trait IEntity {
    /// エンティティIDの取得
    fn get_id(&self) -> &str;

    /// エンティティ種別の取得
    fn kind(&self) -> EntityKind;

    /// 現在の角度位置
    fn position(&self) -> Angle;

    /// 中心からの距離（デバイスは木星半径）
    fn height(&self) -> f64;

    /// 保持ファイルと帯域カウンタ
    fn files(&self) -> &FileStore;

    fn files_mut(&mut self) -> &mut FileStore;

    /// 容量制限（種別ごとの既定値）
    fn capacity(&self) -> Capacity {
        self.kind().capacity()
    }

    fn is_device(&self) -> bool {
        self.kind().is_device()
    }
}

/// 1 分間の移動結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementOutcome {
    /// 通常の移動
    Moved,
    /// テレポートが完了した（0° へ移動し向きが反転）
    Teleported,
}

/// 軌道上を移動するエンティティのインターフェース
pub trait IMovable {
    /// 1 分間の移動処理
    fn move_one_minute(&mut self) -> MovementOutcome;

    /// 1 分あたりの角速度（度）
    fn angular_velocity(&self) -> f64;
}
