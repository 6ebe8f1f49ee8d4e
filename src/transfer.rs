//! # Transfer モジュール
//!
//! ファイル転送の開始判定と、1 分ごとの転送進行処理を提供します。
//!
//! 転送レコードは受信側エンティティにのみ保持され、送信元・受信先は
//! ID で参照されます。毎ティック ID から現在のエンティティ状態を引き直すため、
//! 転送中にエンティティが削除されても参照が宙に浮くことはありません。
//!
//! ## 1 ファイルあたりの判定順序
//!
//! 0. **孤立**: 送信元または受信先が既に存在しない → 受信側の部分ファイルを破棄
//! 1. **テレポート**: 当ティックにテレポートした衛星が関わる → 't' を除去して即時完了
//! 2. **見通し喪失**: デバイスが関わる転送で範囲外 → 受信側の部分ファイルを破棄
//! 3. **通常転送**: 帯域を同時転送数で割った速度で進行

use std::collections::HashSet;

use tracing::debug;

use crate::error::TransferError;
use crate::models::{geometry, EntityKind, FileRecord, IEntity};
use crate::world::World;

/// 当ティックにテレポートを完了した衛星IDの集合
///
/// 移動処理で生成され、同じティックの転送処理で一度だけ参照されます。
pub type TeleportEvents = HashSet<String>;

/// 1 件の未完了ファイルに対する処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// 送信元または受信先が削除済み
    Orphaned,
    /// デバイス→テレポート衛星でテレポート発生: 送信元の原本から全ての 't' を除去
    FlushSenderCopy,
    /// テレポート衛星が関わる転送: 未転送部分から 't' を除去して完了
    FlushRemaining,
    /// 通信範囲外となった
    LineOfSightLost,
    /// 通常の進行（1 分あたりの転送量）
    Progress { rate: usize },
}

/// 1 ティック分の転送統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub progressed: usize,
    pub completed: usize,
    pub dropped: usize,
    pub flushed: usize,
    pub orphaned: usize,
}

fn teleported_now(entity: &dyn IEntity, teleports: &TeleportEvents) -> bool {
    entity.kind() == EntityKind::TeleportingSatellite && teleports.contains(entity.get_id())
}

/// 送受信双方の現在状態から処理結果を決定する
pub fn resolve_outcome(
    sender: Option<&dyn IEntity>,
    receiver: Option<&dyn IEntity>,
    teleports: &TeleportEvents,
) -> TransferOutcome {
    let (Some(sender), Some(receiver)) = (sender, receiver) else {
        return TransferOutcome::Orphaned;
    };

    if teleported_now(receiver, teleports) {
        return if sender.is_device() {
            TransferOutcome::FlushSenderCopy
        } else {
            TransferOutcome::FlushRemaining
        };
    }

    if teleported_now(sender, teleports) {
        return TransferOutcome::FlushRemaining;
    }

    // 衛星同士の転送は範囲外でも継続する
    if (sender.is_device() || receiver.is_device()) && !geometry::in_range(receiver, sender) {
        return TransferOutcome::LineOfSightLost;
    }

    let download_rate = receiver.capacity().download_bandwidth / receiver.files().num_downloading.max(1);
    let upload_rate = sender.capacity().upload_bandwidth / sender.files().num_uploading.max(1);

    TransferOutcome::Progress {
        rate: download_rate.min(upload_rate),
    }
}

/// ファイル転送を開始する
///
/// 判定は全て状態変更の前に行われるため、失敗時には何も変更されません。
pub fn send_file(world: &mut World, filename: &str, from_id: &str, to_id: &str) -> Result<(), TransferError> {
    let sender = world
        .entity(from_id)
        .ok_or_else(|| TransferError::UnknownEntity(from_id.to_string()))?;
    let receiver = world
        .entity(to_id)
        .ok_or_else(|| TransferError::UnknownEntity(to_id.to_string()))?;

    let source = sender
        .files()
        .get(filename)
        .filter(|f| f.is_complete())
        .ok_or_else(|| TransferError::NotFound(filename.to_string()))?;

    if receiver.files().contains(filename) {
        return Err(TransferError::AlreadyExists(filename.to_string()));
    }

    if sender.kind() == EntityKind::RelaySatellite || receiver.kind() == EntityKind::RelaySatellite {
        return Err(TransferError::NoBandwidth(
            "中継衛星はファイルを送受信できません".to_string(),
        ));
    }

    let sender_capacity = sender.capacity();
    let receiver_capacity = receiver.capacity();

    if sender.files().num_uploading >= sender_capacity.upload_bandwidth {
        return Err(TransferError::NoBandwidth(format!(
            "{} の同時アップロード数が上限に達しています",
            from_id
        )));
    }
    if receiver.files().num_downloading >= receiver_capacity.download_bandwidth {
        return Err(TransferError::NoBandwidth(format!(
            "{} の同時ダウンロード数が上限に達しています",
            to_id
        )));
    }

    if receiver.files().total_bytes().saturating_add(source.size()) > receiver_capacity.max_bytes {
        return Err(TransferError::NoBandwidth(format!(
            "{} には {} を受信する容量がありません",
            to_id, filename
        )));
    }

    if receiver.files().len() + 1 > receiver_capacity.max_files {
        return Err(TransferError::NoStorageSpace(format!(
            "{} のファイル数が上限に達しています",
            to_id
        )));
    }

    let record = FileRecord::pending(filename.to_string(), source.content().to_string(), from_id, to_id);
    // 空ファイルは開始時点で完了しており、帯域を占有しない
    let occupies_bandwidth = !record.is_complete();

    if let Some(receiver) = world.entity_mut(to_id) {
        receiver.files_mut().insert(record);
        if occupies_bandwidth {
            receiver.files_mut().begin_download();
        }
    }
    if occupies_bandwidth {
        if let Some(sender) = world.entity_mut(from_id) {
            sender.files_mut().begin_upload();
        }
    }

    debug!("転送開始: {} ({} -> {})", filename, from_id, to_id);
    Ok(())
}

/// 全エンティティの未完了ファイルを 1 分進める
///
/// デバイス、衛星の順に、各エンティティが保持する未完了ファイルを
/// 挿入順に処理します。
pub fn advance_one_minute(world: &mut World, teleports: &TeleportEvents) -> TransferStats {
    let mut stats = TransferStats::default();

    for holder_id in world.transfer_order() {
        let pending = match world.entity(&holder_id) {
            Some(holder) => holder.files().pending_filenames(),
            None => continue,
        };

        for filename in pending {
            advance_file(world, &holder_id, &filename, teleports, &mut stats);
        }
    }

    stats
}

fn advance_file(
    world: &mut World,
    holder_id: &str,
    filename: &str,
    teleports: &TeleportEvents,
    stats: &mut TransferStats,
) {
    let (sender_id, receiver_id) = match world.entity(holder_id).and_then(|h| h.files().get(filename)) {
        Some(record) if !record.is_complete() => (record.sender_id.clone(), record.receiver_id.clone()),
        _ => return,
    };

    let outcome = resolve_outcome(world.entity(&sender_id), world.entity(&receiver_id), teleports);

    match outcome {
        TransferOutcome::Orphaned => {
            remove_record(world, holder_id, filename);
            release_counters(world, &sender_id, &receiver_id);
            stats.orphaned += 1;
            debug!("孤立した転送を破棄: {} ({} -> {})", filename, sender_id, receiver_id);
        }
        TransferOutcome::FlushSenderCopy => {
            remove_record(world, holder_id, filename);
            release_counters(world, &sender_id, &receiver_id);
            if let Some(original) = world
                .entity_mut(&sender_id)
                .and_then(|sender| sender.files_mut().get_mut(filename))
            {
                original.strip_all_t();
            }
            stats.flushed += 1;
            debug!("テレポートにより送信元の {} を書き換え ({})", filename, sender_id);
        }
        TransferOutcome::FlushRemaining => {
            if let Some(record) = world
                .entity_mut(holder_id)
                .and_then(|holder| holder.files_mut().get_mut(filename))
            {
                record.flush_remaining_without_t();
            }
            release_counters(world, &sender_id, &receiver_id);
            stats.flushed += 1;
            debug!("テレポートにより {} を即時完了 ({} -> {})", filename, sender_id, receiver_id);
        }
        TransferOutcome::LineOfSightLost => {
            remove_record(world, holder_id, filename);
            release_counters(world, &sender_id, &receiver_id);
            stats.dropped += 1;
            debug!("通信範囲外のため {} を破棄 ({} -> {})", filename, sender_id, receiver_id);
        }
        TransferOutcome::Progress { rate } => {
            let completed = world
                .entity_mut(holder_id)
                .and_then(|holder| holder.files_mut().get_mut(filename))
                .map(|record| record.advance(rate))
                .unwrap_or(false);

            stats.progressed += 1;
            if completed {
                release_counters(world, &sender_id, &receiver_id);
                stats.completed += 1;
                debug!("転送完了: {} ({} -> {})", filename, sender_id, receiver_id);
            }
        }
    }
}

fn remove_record(world: &mut World, holder_id: &str, filename: &str) {
    if let Some(holder) = world.entity_mut(holder_id) {
        holder.files_mut().remove(filename);
    }
}

fn release_counters(world: &mut World, sender_id: &str, receiver_id: &str) {
    if let Some(receiver) = world.entity_mut(receiver_id) {
        receiver.files_mut().release_download();
    }
    if let Some(sender) = world.entity_mut(sender_id) {
        sender.files_mut().release_upload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Angle, Device, Satellite, RADIUS_OF_JUPITER};

    fn device(id: &str, kind: EntityKind, degrees: f64) -> Device {
        Device::new(id.into(), kind, Angle::from_degrees(degrees))
    }

    fn satellite(id: &str, kind: EntityKind, degrees: f64) -> Satellite {
        Satellite::new(id.into(), kind, 1_000.0 + RADIUS_OF_JUPITER, Angle::from_degrees(degrees))
    }

    #[test]
    fn test_outcome_orphaned_when_peer_missing() {
        let sat = satellite("S", EntityKind::StandardSatellite, 0.0);
        let outcome = resolve_outcome(None, Some(&sat), &TeleportEvents::new());
        assert_eq!(outcome, TransferOutcome::Orphaned);
    }

    #[test]
    fn test_outcome_teleport_receiver_from_device() {
        let dev = device("D", EntityKind::HandheldDevice, 0.0);
        let tele = satellite("T", EntityKind::TeleportingSatellite, 0.0);
        let teleports: TeleportEvents = ["T".to_string()].into_iter().collect();

        assert_eq!(
            resolve_outcome(Some(&dev), Some(&tele), &teleports),
            TransferOutcome::FlushSenderCopy
        );
        assert_eq!(
            resolve_outcome(Some(&tele), Some(&dev), &teleports),
            TransferOutcome::FlushRemaining
        );
    }

    #[test]
    fn test_outcome_teleport_between_satellites() {
        let std_sat = satellite("S", EntityKind::StandardSatellite, 0.0);
        let tele = satellite("T", EntityKind::TeleportingSatellite, 0.0);
        let teleports: TeleportEvents = ["T".to_string()].into_iter().collect();

        assert_eq!(
            resolve_outcome(Some(&std_sat), Some(&tele), &teleports),
            TransferOutcome::FlushRemaining
        );
        assert_eq!(
            resolve_outcome(Some(&tele), Some(&std_sat), &teleports),
            TransferOutcome::FlushRemaining
        );
    }

    #[test]
    fn test_outcome_without_teleport_event_progresses() {
        let dev = device("D", EntityKind::HandheldDevice, 0.0);
        let mut tele = satellite("T", EntityKind::TeleportingSatellite, 0.0);
        tele.files.begin_download();

        let outcome = resolve_outcome(Some(&dev), Some(&tele), &TeleportEvents::new());
        assert_eq!(outcome, TransferOutcome::Progress { rate: 15 });
    }

    #[test]
    fn test_outcome_line_of_sight_lost_for_device() {
        let dev = device("D", EntityKind::HandheldDevice, 180.0);
        let sat = satellite("S", EntityKind::StandardSatellite, 0.0);
        assert_eq!(
            resolve_outcome(Some(&dev), Some(&sat), &TeleportEvents::new()),
            TransferOutcome::LineOfSightLost
        );
    }

    #[test]
    fn test_outcome_satellite_pair_ignores_range() {
        let mut a = satellite("A", EntityKind::StandardSatellite, 0.0);
        let mut b = satellite("B", EntityKind::TeleportingSatellite, 180.0);
        a.files.begin_upload();
        b.files.begin_download();

        assert_eq!(
            resolve_outcome(Some(&a), Some(&b), &TeleportEvents::new()),
            TransferOutcome::Progress { rate: 1 }
        );
    }

    #[test]
    fn test_rate_shared_between_downloads() {
        let mut dev = device("D", EntityKind::LaptopDevice, 0.0);
        let mut tele = satellite("T", EntityKind::TeleportingSatellite, 0.0);
        dev.files.begin_upload();
        dev.files.begin_upload();
        tele.files.begin_download();
        tele.files.begin_download();

        // 15 / 2 = 7（整数除算）
        assert_eq!(
            resolve_outcome(Some(&dev), Some(&tele), &TeleportEvents::new()),
            TransferOutcome::Progress { rate: 7 }
        );
    }
}
