use thiserror::Error;

use crate::models::EntityKind;

/// ファイル転送・ファイル追加のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// 送信元にファイルが存在しない、または転送が完了していない
    #[error("ファイル {0} が存在しないか、まだ転送が完了していません")]
    NotFound(String),

    /// 宛先に同名のファイルが既に存在する
    #[error("ファイル {0} は既に存在します")]
    AlreadyExists(String),

    /// 帯域または容量（バイト数）不足
    #[error("帯域が不足しています: {0}")]
    NoBandwidth(String),

    /// ファイル数の上限に達している
    #[error("保存領域が不足しています: {0}")]
    NoStorageSpace(String),

    #[error("エンティティが見つかりません: {0}")]
    UnknownEntity(String),
}

/// エンティティ登録のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("エンティティID {0} は既に登録されています")]
    DuplicateEntity(String),

    #[error("エンティティ {id} の種別 {kind} はこの操作に使用できません")]
    KindMismatch { id: String, kind: EntityKind },

    #[error("エンティティが見つかりません: {0}")]
    UnknownEntity(String),
}

/// シミュレーション実行時のエラー
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Scenario(#[from] crate::scenario::ScenarioError),

    #[error("初期化エラー: {0}")]
    World(#[from] WorldError),

    #[error("初期ファイル配置エラー: {0}")]
    Transfer(#[from] TransferError),

    #[error("レポート出力エラー: {0}")]
    Report(#[from] serde_yaml::Error),
}
