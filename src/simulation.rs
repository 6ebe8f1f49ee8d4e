//! # Simulation モジュール
//!
//! 木星周回衛星とデバイス間のファイル転送シミュレーションを駆動するエンジンを提供します。
//!
//! シナリオ設定から [`World`] を構築し、1 分刻みのティックを繰り返しながら
//! 時刻付きイベント（ファイル送信、エンティティの追加・削除など）を実行します。
//!
//! ## 1 分あたりの処理順序
//!
//! 1. **イベント実行**: `at_minute` が現在時刻以下のイベントを定義順に実行
//! 2. **ティック**: 衛星移動 → 転送処理（[`World::tick`]）
//! 3. **進行状況出力**: `progress_every` 分ごとに統計を出力
//!
//! 最終分を指すイベントは最後のティックの後に実行されます。
//!
//! ## 使用例
//!
//! ```no_run
//! use orbitsim::scenario::ScenarioConfig;
//! use orbitsim::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/basic_transfer.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! engine.run();
//! engine.print_report()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::error::{SimulationError, TransferError, WorldError};
use crate::models::{Angle, IEntity};
use crate::scenario::{ScenarioAction, ScenarioConfig, ScenarioEvent};
use crate::world::{TickReport, World};

/// 実行全体の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub actions_applied: usize,
    pub actions_rejected: usize,
    pub teleports: usize,
    pub transfers_completed: usize,
    pub transfers_dropped: usize,
    pub transfers_flushed: usize,
    pub transfers_orphaned: usize,
}

impl RunStats {
    fn record_tick(&mut self, report: &TickReport) {
        self.teleports += report.teleports.len();
        self.transfers_completed += report.transfers.completed;
        self.transfers_dropped += report.transfers.dropped;
        self.transfers_flushed += report.transfers.flushed;
        self.transfers_orphaned += report.transfers.orphaned;
    }
}

/// イベント実行時のエラー（ログ出力のみでシミュレーションは継続）
#[derive(Debug, Error)]
enum ActionError {
    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

pub struct SimulationEngine {
    pub world: World,
    pub max_minutes: u64,
    pub progress_every: u64,
    pub stats: RunStats,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    /// `at_minute` で安定ソートしたイベント
    events: Vec<ScenarioEvent>,
    next_event: usize,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        let mut events = scenario.events.clone();
        events.sort_by_key(|e| e.at_minute);

        Self {
            world: World::new(),
            max_minutes: scenario.sim.minutes,
            progress_every: scenario.sim.progress_every.max(1),
            stats: RunStats::default(),
            scenario_config: scenario,
            verbose_level,
            events,
            next_event: 0,
        }
    }

    pub fn initialize(&mut self) -> Result<(), SimulationError> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.initialize_devices()?;
        self.initialize_satellites()?;

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  デバイス: {}台", self.world.list_device_ids().len());
            info!("  衛星: {}機", self.world.list_satellite_ids().len());
            info!("  イベント: {}件", self.events.len());
        }

        Ok(())
    }

    fn initialize_devices(&mut self) -> Result<(), SimulationError> {
        for device_config in &self.scenario_config.devices {
            self.world.create_device(
                &device_config.id,
                device_config.kind,
                Angle::from_degrees(device_config.position_deg),
            )?;

            for file in &device_config.files {
                self.world.add_file(&device_config.id, &file.name, &file.content)?;
            }

            if self.verbose_level > 1 {
                debug!(
                    "デバイス初期化: {} ({}, {:.2}°, ファイル {}件)",
                    device_config.id,
                    device_config.kind,
                    device_config.position_deg,
                    device_config.files.len()
                );
            }
        }

        Ok(())
    }

    fn initialize_satellites(&mut self) -> Result<(), SimulationError> {
        for satellite_config in &self.scenario_config.satellites {
            self.world.create_satellite(
                &satellite_config.id,
                satellite_config.kind,
                satellite_config.height,
                Angle::from_degrees(satellite_config.position_deg),
            )?;

            if self.verbose_level > 1 {
                debug!(
                    "衛星初期化: {} ({}, 高度 {:.0}, {:.2}°)",
                    satellite_config.id, satellite_config.kind, satellite_config.height, satellite_config.position_deg
                );
            }
        }

        Ok(())
    }

    pub fn run(&mut self) {
        info!("=== シミュレーション実行開始 ===");

        while self.world.current_minute() < self.max_minutes {
            self.apply_due_events();
            self.step();

            let minute = self.world.current_minute();
            if minute % self.progress_every == 0 && self.verbose_level > 0 {
                let progress = (minute as f64 / self.max_minutes as f64) * 100.0;
                info!(
                    "進行状況: {:.1}% ({}/{}分, 完了 {}件, 破棄 {}件)",
                    progress,
                    minute,
                    self.max_minutes,
                    self.stats.transfers_completed,
                    self.stats.transfers_dropped
                );
            }
        }

        // 最終分を指すイベント
        self.apply_due_events();

        info!("=== シミュレーション完了 ===");
        info!("経過時間: {}分", self.world.current_minute());
        info!(
            "イベント: 実行 {}件, 却下 {}件",
            self.stats.actions_applied, self.stats.actions_rejected
        );
    }

    fn step(&mut self) {
        let report = self.world.tick();

        if self.verbose_level > 1 {
            for id in &report.teleports {
                if let Some(satellite) = self.world.satellite(id) {
                    debug!(
                        "テレポート: {} ({}分, 新しい進行方向: {:?})",
                        id, report.minute, satellite.direction
                    );
                }
            }
        }

        if self.verbose_level > 2 {
            trace!(
                "時刻: {}分 (進行 {}件, 完了 {}件)",
                report.minute,
                report.transfers.progressed,
                report.transfers.completed
            );
        }

        self.stats.record_tick(&report);
    }

    fn apply_due_events(&mut self) {
        let minute = self.world.current_minute();

        while let Some(event) = self.events.get(self.next_event) {
            if event.at_minute > minute {
                break;
            }
            let action = event.action.clone();
            self.next_event += 1;

            match self.apply_action(&action) {
                Ok(()) => {
                    self.stats.actions_applied += 1;
                    if self.verbose_level > 0 {
                        info!("{}分: {:?} を実行", minute, action);
                    }
                }
                Err(e) => {
                    self.stats.actions_rejected += 1;
                    warn!("{}分: {:?} は却下されました: {}", minute, action, e);
                }
            }
        }
    }

    fn apply_action(&mut self, action: &ScenarioAction) -> Result<(), ActionError> {
        match action {
            ScenarioAction::SendFile { file, from, to } => {
                self.world.send_file(file, from, to)?;
            }
            ScenarioAction::AddFile { entity, name, content } => {
                self.world.add_file(entity, name, content)?;
            }
            ScenarioAction::RemoveEntity { id } => {
                self.world.remove_entity(id)?;
            }
            ScenarioAction::CreateDevice { id, kind, position_deg } => {
                self.world.create_device(id, *kind, Angle::from_degrees(*position_deg))?;
            }
            ScenarioAction::CreateSatellite { id, kind, height, position_deg } => {
                self.world
                    .create_satellite(id, *kind, *height, Angle::from_degrees(*position_deg))?;
            }
        }
        Ok(())
    }

    /// 全エンティティの状態を YAML で出力
    pub fn print_report(&self) -> Result<(), SimulationError> {
        println!("=== 最終状態 ({}分) ===", self.world.current_minute());
        print!("{}", serde_yaml::to_string(&self.world.describe_all())?);
        println!();

        println!("=== 集計 ===");
        println!("イベント実行: {}件", self.stats.actions_applied);
        println!("イベント却下: {}件", self.stats.actions_rejected);
        println!("テレポート: {}回", self.stats.teleports);
        println!("転送完了: {}件", self.stats.transfers_completed);
        println!("テレポートによる即時完了: {}件", self.stats.transfers_flushed);
        println!("範囲外による破棄: {}件", self.stats.transfers_dropped);
        println!("孤立による破棄: {}件", self.stats.transfers_orphaned);

        let incomplete: usize = self
            .world
            .list_device_ids()
            .iter()
            .chain(self.world.list_satellite_ids().iter())
            .filter_map(|id| self.world.entity(id))
            .map(|e| e.files().pending_filenames().len())
            .sum();
        println!("未完了の転送: {}件", incomplete);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
meta:
  version: "1.0"
  name: engine-test
  description: device to satellite and back
sim:
  minutes: 40
  progress_every: 5
devices:
  - id: DeviceB
    kind: LaptopDevice
    position_deg: 350
    files:
      - name: FileAlpha
        content: "We computer"
  - id: DeviceC
    kind: HandheldDevice
    position_deg: 330
satellites:
  - id: Satellite1
    kind: StandardSatellite
    height: 80911
    position_deg: 0
events:
  - at_minute: 0
    action: send_file
    file: FileAlpha
    from: DeviceB
    to: Satellite1
  - at_minute: 0
    action: send_file
    file: Missing
    from: DeviceB
    to: Satellite1
  - at_minute: 15
    action: send_file
    file: FileAlpha
    from: Satellite1
    to: DeviceC
  - at_minute: 40
    action: add_file
    entity: DeviceC
    name: Note
    content: "late"
"#;

    fn engine(yaml: &str) -> SimulationEngine {
        let config = ScenarioConfig::from_yaml_str(yaml).unwrap();
        let mut engine = SimulationEngine::new(config, 0);
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn test_initialize_builds_world() {
        let engine = engine(SCENARIO);
        assert_eq!(engine.world.list_device_ids(), vec!["DeviceB", "DeviceC"]);
        assert_eq!(engine.world.list_satellite_ids(), vec!["Satellite1"]);
        let info = engine.world.describe("DeviceB").unwrap();
        assert!(info.files["FileAlpha"].is_complete);
    }

    #[test]
    fn test_run_round_trip() {
        let mut engine = engine(SCENARIO);
        engine.run();

        assert_eq!(engine.world.current_minute(), 40);
        assert_eq!(engine.stats.actions_applied, 3);
        assert_eq!(engine.stats.actions_rejected, 1);
        assert_eq!(engine.stats.transfers_completed, 2);

        let info = engine.world.describe("DeviceC").unwrap();
        assert_eq!(info.files["FileAlpha"].data, "We computer");
        assert!(info.files["FileAlpha"].is_complete);
        // 最終分のイベントは最後のティックの後に実行される
        assert!(info.files["Note"].is_complete);
    }

    #[test]
    fn test_events_fire_before_tick_of_same_minute() {
        let yaml = SCENARIO.replace("minutes: 40", "minutes: 3");
        let yaml = yaml.replace("at_minute: 15", "at_minute: 3").replace("at_minute: 40", "at_minute: 3");
        let mut engine = engine(&yaml);
        engine.run();

        // 送信はティック 1 の前に開始され、3 ティック後にも 11 バイト中 3 バイトのみ
        let info = engine.world.describe("Satellite1").unwrap();
        assert_eq!(info.files["FileAlpha"].data, "We ");
        assert!(!info.files["FileAlpha"].is_complete);
    }

    #[test]
    fn test_duplicate_initial_entity_is_error() {
        let config = ScenarioConfig::from_yaml_str(SCENARIO).unwrap();
        let mut engine = SimulationEngine::new(config, 0);
        engine.world.create_device("DeviceB", crate::models::EntityKind::HandheldDevice, Angle::zero()).unwrap();
        assert!(matches!(
            engine.initialize(),
            Err(SimulationError::World(WorldError::DuplicateEntity(_)))
        ));
    }

    #[test]
    fn test_report_serializes() {
        let mut engine = engine(SCENARIO);
        engine.run();
        assert!(engine.print_report().is_ok());
    }

    #[test]
    fn test_bundled_teleport_scenario() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/teleport_corruption.yaml");
        let config = ScenarioConfig::from_file(path).unwrap();
        let mut engine = SimulationEngine::new(config, 0);
        engine.initialize().unwrap();
        engine.run();

        let info = engine.world.describe("DeviceB").unwrap();
        assert_eq!(info.files["FileA"].data, "testing if the telepor ess esabiliy o es");
        assert!(info.files["FileA"].is_complete);
        assert!(engine.world.describe("TeleportSatellite").is_none());
        assert_eq!(engine.stats.actions_rejected, 0);
        assert!(engine.stats.teleports >= 1);
    }

    #[test]
    fn test_bundled_basic_scenario() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/basic_transfer.yaml");
        let config = ScenarioConfig::from_file(path).unwrap();
        let mut engine = SimulationEngine::new(config, 0);
        engine.initialize().unwrap();
        engine.run();

        // 中継衛星宛ての送信のみ却下
        assert_eq!(engine.stats.actions_rejected, 1);
        let info = engine.world.describe("DeviceC").unwrap();
        assert_eq!(info.files["FileAlpha"].data, "We computer");
    }
}
