use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{EntityKind, RADIUS_OF_JUPITER};

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// シミュレーション時間（分）
    pub minutes: u64,
    /// 進行状況を出力する間隔（分）
    #[serde(default = "default_progress_every")]
    pub progress_every: u64,
}

fn default_progress_every() -> u64 {
    10
}

/// 初期配置ファイル
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileConfig {
    pub name: String,
    pub content: String,
}

/// デバイス設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    pub id: String,
    pub kind: EntityKind,
    pub position_deg: f64,
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// 衛星設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SatelliteConfig {
    pub id: String,
    pub kind: EntityKind,
    /// 木星中心からの軌道半径
    pub height: f64,
    pub position_deg: f64,
}

/// 時刻指定で実行する操作
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioAction {
    SendFile { file: String, from: String, to: String },
    AddFile { entity: String, name: String, content: String },
    RemoveEntity { id: String },
    CreateDevice { id: String, kind: EntityKind, position_deg: f64 },
    CreateSatellite { id: String, kind: EntityKind, height: f64, position_deg: f64 },
}

/// 時刻付きイベント
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioEvent {
    /// 実行する経過分（この分のティック前に実行）
    pub at_minute: u64,
    #[serde(flatten)]
    pub action: ScenarioAction,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub satellites: Vec<SatelliteConfig>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.minutes == 0 {
            return Err(ScenarioError::ValidationError("minutes must be positive".to_string()));
        }
        if self.sim.progress_every == 0 {
            return Err(ScenarioError::ValidationError("progress_every must be positive".to_string()));
        }

        let mut ids = HashSet::new();

        for device in &self.devices {
            if !device.kind.is_device() {
                return Err(ScenarioError::ValidationError(format!(
                    "Device {} has satellite kind {}",
                    device.id, device.kind
                )));
            }
            check_angle(&device.id, device.position_deg)?;
            if !ids.insert(device.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("Duplicate id {}", device.id)));
            }

            let mut names = HashSet::new();
            for file in &device.files {
                if !names.insert(file.name.as_str()) {
                    return Err(ScenarioError::ValidationError(format!(
                        "Duplicate file {} on {}",
                        file.name, device.id
                    )));
                }
            }
        }

        for satellite in &self.satellites {
            if !satellite.kind.is_satellite() {
                return Err(ScenarioError::ValidationError(format!(
                    "Satellite {} has device kind {}",
                    satellite.id, satellite.kind
                )));
            }
            check_angle(&satellite.id, satellite.position_deg)?;
            check_height(&satellite.id, satellite.height)?;
            if !ids.insert(satellite.id.as_str()) {
                return Err(ScenarioError::ValidationError(format!("Duplicate id {}", satellite.id)));
            }
        }

        for event in &self.events {
            if event.at_minute > self.sim.minutes {
                return Err(ScenarioError::ValidationError(format!(
                    "Event at minute {} exceeds simulation length {}",
                    event.at_minute, self.sim.minutes
                )));
            }

            match &event.action {
                ScenarioAction::CreateDevice { id, kind, position_deg } => {
                    if !kind.is_device() {
                        return Err(ScenarioError::ValidationError(format!(
                            "create_device {} with satellite kind {}",
                            id, kind
                        )));
                    }
                    check_angle(id, *position_deg)?;
                }
                ScenarioAction::CreateSatellite { id, kind, height, position_deg } => {
                    if !kind.is_satellite() {
                        return Err(ScenarioError::ValidationError(format!(
                            "create_satellite {} with device kind {}",
                            id, kind
                        )));
                    }
                    check_angle(id, *position_deg)?;
                    check_height(id, *height)?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("シミュレーション時間: {}分", self.sim.minutes);
        println!("進行状況の出力間隔: {}分", self.sim.progress_every);
        println!();

        println!("=== エンティティ ===");
        println!("デバイス: {}台", self.devices.len());
        for device in &self.devices {
            println!(
                "  {}: {} ({:.2}°, ファイル {}件)",
                device.id,
                device.kind,
                device.position_deg,
                device.files.len()
            );
        }
        println!("衛星: {}機", self.satellites.len());
        for satellite in &self.satellites {
            println!(
                "  {}: {} (高度 {:.0}, {:.2}°)",
                satellite.id, satellite.kind, satellite.height, satellite.position_deg
            );
        }
        println!();

        println!("=== イベント ===");
        println!("イベント数: {}", self.events.len());
    }
}

fn check_angle(id: &str, degrees: f64) -> Result<(), ScenarioError> {
    if !degrees.is_finite() {
        return Err(ScenarioError::ValidationError(format!("Invalid position for {}", id)));
    }
    Ok(())
}

fn check_height(id: &str, height: f64) -> Result<(), ScenarioError> {
    if !height.is_finite() || height <= RADIUS_OF_JUPITER {
        return Err(ScenarioError::ValidationError(format!(
            "Satellite {} height {} must exceed the planet radius {}",
            id, height, RADIUS_OF_JUPITER
        )));
    }
    Ok(())
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
meta:
  version: "1.0"
  name: sample
  description: teleport relay sample
sim:
  minutes: 12
devices:
  - id: DeviceA
    kind: HandheldDevice
    position_deg: 176
    files:
      - name: FileA
        content: "hello"
satellites:
  - id: Tele
    kind: TeleportingSatellite
    height: 70911
    position_deg: 174
events:
  - at_minute: 0
    action: send_file
    file: FileA
    from: DeviceA
    to: Tele
  - at_minute: 5
    action: create_satellite
    id: Standard
    kind: StandardSatellite
    height: 70911
    position_deg: 182
"#;

    #[test]
    fn test_parse_sample() {
        let config = ScenarioConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.sim.minutes, 12);
        assert_eq!(config.sim.progress_every, 10);
        assert_eq!(config.devices[0].files[0].name, "FileA");
        assert_eq!(config.satellites[0].kind, EntityKind::TeleportingSatellite);
        assert_eq!(
            config.events[0].action,
            ScenarioAction::SendFile {
                file: "FileA".into(),
                from: "DeviceA".into(),
                to: "Tele".into(),
            }
        );
        assert!(matches!(config.events[1].action, ScenarioAction::CreateSatellite { .. }));
    }

    #[test]
    fn test_rejects_low_satellite() {
        let yaml = SAMPLE.replace("height: 70911\n    position_deg: 174", "height: 1000\n    position_deg: 174");
        let err = ScenarioConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_event_after_end() {
        let yaml = SAMPLE.replace("at_minute: 5", "at_minute: 50");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_kind_in_wrong_section() {
        let yaml = SAMPLE.replace("kind: HandheldDevice", "kind: RelaySatellite");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let yaml = SAMPLE.replace("kind: HandheldDevice", "kind: Toaster");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ParseError(..))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScenarioConfig::from_file("does/not/exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
