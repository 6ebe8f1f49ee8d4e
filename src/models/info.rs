use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{file::FileRecord, kind::EntityKind, traits::IEntity};

/// ファイル情報（レポート出力用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub filename: String,
    /// 現在受信済みの内容
    pub data: String,
    pub size: usize,
    pub is_complete: bool,
}

impl From<&FileRecord> for FileInfo {
    fn from(record: &FileRecord) -> Self {
        Self {
            filename: record.filename.clone(),
            data: record.present_content(),
            size: record.size(),
            is_complete: record.is_complete(),
        }
    }
}

/// エンティティ情報（レポート出力用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityInfo {
    pub id: String,
    pub position_deg: f64,
    pub height: f64,
    pub kind: EntityKind,
    pub files: BTreeMap<String, FileInfo>,
}

impl EntityInfo {
    pub fn from_entity(entity: &dyn IEntity) -> Self {
        let files = entity
            .files()
            .iter()
            .map(|record| (record.filename.clone(), FileInfo::from(record)))
            .collect();

        Self {
            id: entity.get_id().to_string(),
            position_deg: entity.position().to_degrees(),
            height: entity.height(),
            kind: entity.kind(),
            files,
        }
    }
}
