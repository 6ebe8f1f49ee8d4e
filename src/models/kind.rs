use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// エンティティの種類
///
/// デバイス 3 種と衛星 3 種の閉じた列挙型です。種類ごとの性能値
/// （通信範囲、容量、速度、通信可能な相手）は下の性能表から引きます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    HandheldDevice,
    LaptopDevice,
    DesktopDevice,
    StandardSatellite,
    TeleportingSatellite,
    RelaySatellite,
}

/// 容量制限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// 保持できる最大ファイル数
    pub max_files: usize,
    /// 保持できる最大バイト数
    pub max_bytes: usize,
    /// 同時アップロード数の上限
    pub upload_bandwidth: usize,
    /// 同時ダウンロード数の上限
    pub download_bandwidth: usize,
}

impl Capacity {
    pub const UNLIMITED: Capacity = Capacity {
        max_files: usize::MAX,
        max_bytes: usize::MAX,
        upload_bandwidth: usize::MAX,
        download_bandwidth: usize::MAX,
    };
}

const ALL_SATELLITES: &[EntityKind] = &[
    EntityKind::StandardSatellite,
    EntityKind::TeleportingSatellite,
    EntityKind::RelaySatellite,
];

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::HandheldDevice,
        EntityKind::LaptopDevice,
        EntityKind::DesktopDevice,
        EntityKind::StandardSatellite,
        EntityKind::TeleportingSatellite,
        EntityKind::RelaySatellite,
    ];

    pub fn is_device(&self) -> bool {
        matches!(
            self,
            EntityKind::HandheldDevice | EntityKind::LaptopDevice | EntityKind::DesktopDevice
        )
    }

    pub fn is_satellite(&self) -> bool {
        !self.is_device()
    }

    /// この種類を相手とする通信の最大距離
    pub fn range_limit(&self) -> f64 {
        match self {
            EntityKind::HandheldDevice => 50_000.0,
            EntityKind::LaptopDevice => 100_000.0,
            EntityKind::DesktopDevice => 200_000.0,
            EntityKind::StandardSatellite => 150_000.0,
            EntityKind::TeleportingSatellite => 200_000.0,
            EntityKind::RelaySatellite => 300_000.0,
        }
    }

    /// 既定の容量制限
    pub fn capacity(&self) -> Capacity {
        match self {
            EntityKind::HandheldDevice | EntityKind::LaptopDevice | EntityKind::DesktopDevice => {
                Capacity::UNLIMITED
            }
            EntityKind::StandardSatellite => Capacity {
                max_files: 3,
                max_bytes: 80,
                upload_bandwidth: 1,
                download_bandwidth: 1,
            },
            EntityKind::TeleportingSatellite => Capacity {
                max_files: 200,
                max_bytes: 200,
                upload_bandwidth: 10,
                download_bandwidth: 15,
            },
            EntityKind::RelaySatellite => Capacity {
                max_files: 0,
                max_bytes: 0,
                upload_bandwidth: usize::MAX,
                download_bandwidth: usize::MAX,
            },
        }
    }

    /// 軌道上の線速度（1 分あたり）。デバイスは移動しない
    pub fn linear_speed(&self) -> Option<f64> {
        match self {
            EntityKind::StandardSatellite => Some(2_500.0),
            EntityKind::TeleportingSatellite => Some(1_000.0),
            EntityKind::RelaySatellite => Some(1_500.0),
            _ => None,
        }
    }

    /// この種類が通信できる相手の種類
    pub fn supported_peers(&self) -> &'static [EntityKind] {
        match self {
            EntityKind::DesktopDevice => &[
                EntityKind::TeleportingSatellite,
                EntityKind::RelaySatellite,
            ],
            EntityKind::HandheldDevice | EntityKind::LaptopDevice => ALL_SATELLITES,
            EntityKind::StandardSatellite => &[
                EntityKind::HandheldDevice,
                EntityKind::LaptopDevice,
                EntityKind::StandardSatellite,
                EntityKind::TeleportingSatellite,
                EntityKind::RelaySatellite,
            ],
            EntityKind::TeleportingSatellite | EntityKind::RelaySatellite => &EntityKind::ALL,
        }
    }

    pub fn supports(&self, other: EntityKind) -> bool {
        self.supported_peers().contains(&other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::HandheldDevice => "HandheldDevice",
            EntityKind::LaptopDevice => "LaptopDevice",
            EntityKind::DesktopDevice => "DesktopDevice",
            EntityKind::StandardSatellite => "StandardSatellite",
            EntityKind::TeleportingSatellite => "TeleportingSatellite",
            EntityKind::RelaySatellite => "RelaySatellite",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("無効なエンティティ種別: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            EntityKind::from_str("RelaySatellite"),
            Ok(EntityKind::RelaySatellite)
        );
        assert!(EntityKind::from_str("Rocket").is_err());
    }

    #[test]
    fn test_device_satellite_split() {
        let devices = EntityKind::ALL.iter().filter(|k| k.is_device()).count();
        assert_eq!(devices, 3);
        assert!(EntityKind::TeleportingSatellite.is_satellite());
        assert!(EntityKind::DesktopDevice.linear_speed().is_none());
    }

    #[test]
    fn test_supported_peers() {
        assert!(!EntityKind::DesktopDevice.supports(EntityKind::StandardSatellite));
        assert!(EntityKind::LaptopDevice.supports(EntityKind::StandardSatellite));
        assert!(!EntityKind::StandardSatellite.supports(EntityKind::DesktopDevice));
        assert!(EntityKind::RelaySatellite.supports(EntityKind::DesktopDevice));
        assert!(!EntityKind::HandheldDevice.supports(EntityKind::LaptopDevice));
    }

    #[test]
    fn test_capacity_table() {
        let standard = EntityKind::StandardSatellite.capacity();
        assert_eq!(standard.max_files, 3);
        assert_eq!(standard.max_bytes, 80);
        assert_eq!(EntityKind::TeleportingSatellite.capacity().download_bandwidth, 15);
        assert_eq!(EntityKind::RelaySatellite.capacity().max_files, 0);
    }
}
