//! # World モジュール
//!
//! デバイスと衛星の登録簿、および 1 ティック（1 分）の進行処理を提供します。
//!
//! エンティティは登録順に保持され、各ティックは以下の順序で処理されます：
//!
//! 1. **衛星移動**: 全衛星を 1 分分移動し、テレポート完了イベントを収集
//! 2. **転送処理**: デバイス、衛星の順に保持中の未完了ファイルを進行
//!
//! テレポート完了イベントは同じティックの転送処理でのみ参照され、
//! 次のティックには持ち越されません。

use tracing::{debug, trace};

use crate::error::{TransferError, WorldError};
use crate::models::{
    geometry, Angle, Device, EntityInfo, EntityKind, FileRecord, IEntity, IMovable, MovementOutcome, Satellite,
};
use crate::transfer::{self, TeleportEvents, TransferStats};

/// 1 ティックの処理結果
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// 処理後の経過分
    pub minute: u64,
    /// このティックでテレポートした衛星ID
    pub teleports: TeleportEvents,
    pub transfers: TransferStats,
}

/// シミュレーション世界の状態
#[derive(Debug, Clone, Default)]
pub struct World {
    devices: Vec<Device>,
    satellites: Vec<Satellite>,
    minute: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_minute(&self) -> u64 {
        self.minute
    }

    fn contains(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// デバイスを登録
    pub fn create_device(&mut self, id: &str, kind: EntityKind, position: Angle) -> Result<(), WorldError> {
        if !kind.is_device() {
            return Err(WorldError::KindMismatch { id: id.to_string(), kind });
        }
        if self.contains(id) {
            return Err(WorldError::DuplicateEntity(id.to_string()));
        }

        self.devices.push(Device::new(id.to_string(), kind, position));
        Ok(())
    }

    /// 衛星を登録
    pub fn create_satellite(
        &mut self,
        id: &str,
        kind: EntityKind,
        height: f64,
        position: Angle,
    ) -> Result<(), WorldError> {
        if !kind.is_satellite() {
            return Err(WorldError::KindMismatch { id: id.to_string(), kind });
        }
        if self.contains(id) {
            return Err(WorldError::DuplicateEntity(id.to_string()));
        }

        self.satellites.push(Satellite::new(id.to_string(), kind, height, position));
        Ok(())
    }

    /// エンティティを削除
    ///
    /// 削除したエンティティが受信中だった転送は、送信元のアップロード枠を
    /// 即座に解放します。削除したエンティティが送信中だった転送の部分ファイルは
    /// 受信側に残り、次のティックで孤立転送として破棄されます。
    pub fn remove_entity(&mut self, id: &str) -> Result<EntityKind, WorldError> {
        let (kind, files) = if let Some(index) = self.devices.iter().position(|d| d.id == id) {
            let device = self.devices.remove(index);
            (device.kind, device.files)
        } else if let Some(index) = self.satellites.iter().position(|s| s.id == id) {
            let satellite = self.satellites.remove(index);
            (satellite.kind, satellite.files)
        } else {
            return Err(WorldError::UnknownEntity(id.to_string()));
        };

        for record in files.iter().filter(|r| !r.is_complete()) {
            if let Some(sender) = self.entity_mut(&record.sender_id) {
                sender.files_mut().release_upload();
                debug!(
                    "受信側 {} の削除により {} の転送を中止 (送信元: {})",
                    id, record.filename, record.sender_id
                );
            }
        }

        Ok(kind)
    }

    pub fn list_device_ids(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.id.clone()).collect()
    }

    pub fn list_satellite_ids(&self) -> Vec<String> {
        self.satellites.iter().map(|s| s.id.clone()).collect()
    }

    pub fn entity(&self, id: &str) -> Option<&dyn IEntity> {
        if let Some(device) = self.devices.iter().find(|d| d.id == id) {
            return Some(device as &dyn IEntity);
        }
        self.satellites
            .iter()
            .find(|s| s.id == id)
            .map(|s| s as &dyn IEntity)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut dyn IEntity> {
        if let Some(device) = self.devices.iter_mut().find(|d| d.id == id) {
            return Some(device as &mut dyn IEntity);
        }
        self.satellites
            .iter_mut()
            .find(|s| s.id == id)
            .map(|s| s as &mut dyn IEntity)
    }

    pub fn satellite(&self, id: &str) -> Option<&Satellite> {
        self.satellites.iter().find(|s| s.id == id)
    }

    /// 転送処理の巡回順（デバイス、衛星の登録順）
    pub(crate) fn transfer_order(&self) -> Vec<String> {
        self.devices
            .iter()
            .map(|d| d.id.clone())
            .chain(self.satellites.iter().map(|s| s.id.clone()))
            .collect()
    }

    /// 転送を経ずに完了済みファイルを追加
    pub fn add_file(&mut self, id: &str, filename: &str, content: &str) -> Result<(), TransferError> {
        let entity = self
            .entity_mut(id)
            .ok_or_else(|| TransferError::UnknownEntity(id.to_string()))?;

        if entity.files().contains(filename) {
            return Err(TransferError::AlreadyExists(filename.to_string()));
        }

        entity
            .files_mut()
            .insert(FileRecord::complete(filename.to_string(), content.to_string(), id));
        Ok(())
    }

    /// ファイル転送を開始
    pub fn send_file(&mut self, filename: &str, from_id: &str, to_id: &str) -> Result<(), TransferError> {
        transfer::send_file(self, filename, from_id, to_id)
    }

    /// `id` と通信可能な他エンティティのID一覧（衛星、デバイスの順）
    pub fn entities_in_range(&self, id: &str) -> Vec<String> {
        let Some(target) = self.entity(id) else {
            return Vec::new();
        };

        let satellites = self
            .satellites
            .iter()
            .filter(|s| geometry::can_communicate(*s, target))
            .map(|s| s.id.clone());
        let devices = self
            .devices
            .iter()
            .filter(|d| geometry::can_communicate(*d, target))
            .map(|d| d.id.clone());

        satellites.chain(devices).collect()
    }

    pub fn describe(&self, id: &str) -> Option<EntityInfo> {
        self.entity(id).map(EntityInfo::from_entity)
    }

    pub fn describe_all(&self) -> Vec<EntityInfo> {
        self.transfer_order()
            .iter()
            .filter_map(|id| self.describe(id))
            .collect()
    }

    /// 1 分進める
    pub fn tick(&mut self) -> TickReport {
        let teleports = self.process_movement();
        let transfers = transfer::advance_one_minute(self, &teleports);
        self.minute += 1;

        trace!(
            "ティック {} 完了 (テレポート: {}, 完了: {}, 破棄: {})",
            self.minute,
            teleports.len(),
            transfers.completed,
            transfers.dropped
        );

        TickReport {
            minute: self.minute,
            teleports,
            transfers,
        }
    }

    /// n 分進める
    pub fn tick_n(&mut self, minutes: u64) {
        for _ in 0..minutes {
            self.tick();
        }
    }

    fn process_movement(&mut self) -> TeleportEvents {
        let mut teleports = TeleportEvents::new();
        for satellite in &mut self.satellites {
            if satellite.move_one_minute() == MovementOutcome::Teleported {
                teleports.insert(satellite.id.clone());
            }
        }
        teleports
    }
}
