use crate::models::{
    common::{Angle, RADIUS_OF_JUPITER},
    file::FileStore,
    kind::EntityKind,
    traits::IEntity,
};

/// 地上デバイス
///
/// 木星表面（半径 RADIUS_OF_JUPITER）上の固定位置にあり、移動しません。
#[derive(Debug, Clone)]
pub struct Device {
    pub id: String,
    pub kind: EntityKind,
    pub position: Angle,
    pub files: FileStore,
}

impl Device {
    /// 新しいデバイスを作成します
    ///
    /// `kind` はデバイス種別であることを呼び出し側で保証してください。
    pub fn new(id: String, kind: EntityKind, position: Angle) -> Self {
        debug_assert!(kind.is_device());
        Self {
            id,
            kind,
            position,
            files: FileStore::new(),
        }
    }
}

impl IEntity for Device {
    fn get_id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn position(&self) -> Angle {
        self.position
    }

    fn height(&self) -> f64 {
        RADIUS_OF_JUPITER
    }

    fn files(&self) -> &FileStore {
        &self.files
    }

    fn files_mut(&mut self) -> &mut FileStore {
        &mut self.files
    }
}
