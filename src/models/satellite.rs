use crate::models::{
    common::{math_utils, Angle, Direction},
    file::FileStore,
    kind::EntityKind,
    traits::{IEntity, IMovable, MovementOutcome},
};
use tracing::trace;

/// テレポートの判定境界（度）
const TELEPORT_BOUNDARY_DEG: f64 = 180.0;

/// 中継衛星の方向判定境界（度）
const RELAY_LOWER_BOUNDARY_DEG: f64 = 140.0;
const RELAY_UPPER_BOUNDARY_DEG: f64 = 190.0;
const RELAY_THRESHOLD_DEG: f64 = 345.0;

/// 衛星エージェント
///
/// 種別ごとに異なる角速度と方向制御で木星の周りを周回します。
/// - 標準衛星: 常に時計回り
/// - テレポート衛星: 180° を越えると 0° へテレポートし向きを反転
/// - 中継衛星: 140°〜190° の区間を往復
#[derive(Debug, Clone)]
pub struct Satellite {
    pub id: String,
    pub kind: EntityKind,
    /// 中心からの軌道半径
    pub height: f64,
    pub position: Angle,
    pub direction: Direction,
    pub files: FileStore,
}

impl Satellite {
    pub fn new(id: String, kind: EntityKind, height: f64, position: Angle) -> Self {
        debug_assert!(kind.is_satellite());
        let direction = match kind {
            EntityKind::TeleportingSatellite => Direction::AntiClockwise,
            _ => Direction::Clockwise,
        };

        Self {
            id,
            kind,
            height,
            position,
            direction,
            files: FileStore::new(),
        }
    }

    fn step(&self, velocity: f64) -> Angle {
        match self.direction {
            Direction::Clockwise => self.position - Angle::from_degrees(velocity),
            Direction::AntiClockwise => self.position + Angle::from_degrees(velocity),
        }
    }

    fn move_standard(&mut self, velocity: f64) -> MovementOutcome {
        self.position = self.position - Angle::from_degrees(velocity);
        MovementOutcome::Moved
    }

    fn move_teleporting(&mut self, velocity: f64) -> MovementOutcome {
        let updated = self.step(velocity).to_degrees();

        let crossed = match self.direction {
            Direction::AntiClockwise => updated > TELEPORT_BOUNDARY_DEG,
            Direction::Clockwise => updated < TELEPORT_BOUNDARY_DEG,
        };

        if crossed {
            self.position = Angle::zero();
            self.direction = match self.direction {
                Direction::AntiClockwise => Direction::Clockwise,
                Direction::Clockwise => Direction::AntiClockwise,
            };
            trace!("テレポート完了: {} (新しい向き: {:?})", self.id, self.direction);
            MovementOutcome::Teleported
        } else {
            self.position = Angle::from_degrees(updated);
            MovementOutcome::Moved
        }
    }

    fn move_relay(&mut self, velocity: f64) -> MovementOutcome {
        let current = self.position.to_degrees();

        // 140°〜190° の区間では直前の向きを維持する
        if current > RELAY_UPPER_BOUNDARY_DEG && current < RELAY_THRESHOLD_DEG {
            self.direction = Direction::Clockwise;
        } else if current < RELAY_LOWER_BOUNDARY_DEG || current >= RELAY_THRESHOLD_DEG {
            self.direction = Direction::AntiClockwise;
        }

        self.position = self.step(velocity);
        MovementOutcome::Moved
    }
}

impl IEntity for Satellite {
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
        self.height
    }

    fn files(&self) -> &FileStore {
        &self.files
    }

    fn files_mut(&mut self) -> &mut FileStore {
        &mut self.files
    }
}

impl IMovable for Satellite {
    fn move_one_minute(&mut self) -> MovementOutcome {
        let velocity = self.angular_velocity();
        match self.kind {
            EntityKind::TeleportingSatellite => self.move_teleporting(velocity),
            EntityKind::RelaySatellite => self.move_relay(velocity),
            _ => self.move_standard(velocity),
        }
    }

    fn angular_velocity(&self) -> f64 {
        let speed = self.kind.linear_speed().unwrap_or(0.0);
        math_utils::angular_velocity_deg(speed, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::common::RADIUS_OF_JUPITER;

    fn satellite(kind: EntityKind, height: f64, degrees: f64) -> Satellite {
        Satellite::new("S".into(), kind, height, Angle::from_degrees(degrees))
    }

    fn assert_angle(actual: Angle, expected: f64) {
        assert!(
            actual.approx_eq(&Angle::from_degrees(expected), 0.01),
            "expected {:.2}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_standard_moves_clockwise() {
        let mut sat = satellite(EntityKind::StandardSatellite, 100.0 + RADIUS_OF_JUPITER, 340.0);
        assert_eq!(sat.move_one_minute(), MovementOutcome::Moved);
        assert_angle(sat.position, 337.95);
    }

    #[test]
    fn test_standard_wraps_below_zero() {
        let mut sat = satellite(EntityKind::StandardSatellite, 100.0 + RADIUS_OF_JUPITER, 1.0);
        sat.move_one_minute();
        assert_angle(sat.position, 358.95);
    }

    #[test]
    fn test_teleporting_moves_anticlockwise_first() {
        let mut sat = satellite(EntityKind::TeleportingSatellite, 10_000.0 + RADIUS_OF_JUPITER, 0.0);
        sat.move_one_minute();
        let first = sat.position;
        sat.move_one_minute();
        assert!(sat.position > first);
    }

    #[test]
    fn test_teleporting_teleports_at_180() {
        let mut sat = satellite(EntityKind::TeleportingSatellite, 10_000.0 + RADIUS_OF_JUPITER, 0.0);
        let mut teleports = 0;
        for _ in 0..252 {
            if sat.move_one_minute() == MovementOutcome::Teleported {
                teleports += 1;
            }
        }
        assert_eq!(teleports, 1);
        assert_eq!(sat.position.to_degrees(), 0.0);
        assert_eq!(sat.direction, Direction::Clockwise);
    }

    #[test]
    fn test_teleporting_clockwise_wraps_then_teleports() {
        let mut sat = satellite(EntityKind::TeleportingSatellite, 1_000.0 + RADIUS_OF_JUPITER, 0.0);
        sat.direction = Direction::Clockwise;

        // 0° から時計回りに進むと 359° 付近へ回り込み、テレポートはしない
        assert_eq!(sat.move_one_minute(), MovementOutcome::Moved);
        assert!(sat.position.to_degrees() > 359.0);

        sat.position = Angle::from_degrees(180.5);
        assert_eq!(sat.move_one_minute(), MovementOutcome::Teleported);
        assert_eq!(sat.direction, Direction::AntiClockwise);
        assert_eq!(sat.position.to_degrees(), 0.0);
    }

    #[test]
    fn test_relay_oscillates_in_band() {
        let mut sat = satellite(EntityKind::RelaySatellite, 100.0 + RADIUS_OF_JUPITER, 180.0);
        sat.move_one_minute();
        assert_angle(sat.position, 178.77);
        sat.move_one_minute();
        assert_angle(sat.position, 177.54);
        sat.move_one_minute();
        assert_angle(sat.position, 176.31);

        for _ in 0..5 {
            sat.move_one_minute();
        }
        assert_angle(sat.position, 170.18);

        for _ in 0..24 {
            sat.move_one_minute();
        }
        assert_angle(sat.position, 140.72);

        sat.move_one_minute();
        assert_angle(sat.position, 139.49);

        // 140° を下回ったので反時計回りに戻る
        sat.move_one_minute();
        assert_angle(sat.position, 140.72);

        for _ in 0..5 {
            sat.move_one_minute();
        }
        assert_angle(sat.position, 146.85);
    }

    #[test]
    fn test_relay_at_threshold_moves_anticlockwise() {
        let mut sat = satellite(EntityKind::RelaySatellite, 1_000.0 + RADIUS_OF_JUPITER, 345.0);
        sat.move_one_minute();
        assert!(sat.position.to_degrees() > 345.0);
        assert_eq!(sat.direction, Direction::AntiClockwise);
    }

    #[test]
    fn test_relay_wraps_past_360_anticlockwise() {
        let mut sat = satellite(EntityKind::RelaySatellite, 1_000.0 + RADIUS_OF_JUPITER, 359.5);
        sat.move_one_minute();
        assert!(sat.position.to_degrees() < 2.0);
        sat.move_one_minute();
        assert_eq!(sat.direction, Direction::AntiClockwise);
    }

    #[test]
    fn test_relay_keeps_direction_inside_band() {
        let mut sat = satellite(EntityKind::RelaySatellite, 1_000.0 + RADIUS_OF_JUPITER, 150.0);
        sat.direction = Direction::AntiClockwise;
        sat.move_one_minute();
        assert!(sat.position.to_degrees() > 150.0);
    }
}
