use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// 木星の半径（距離の基準単位）。デバイスはこの半径上に配置される
pub const RADIUS_OF_JUPITER: f64 = 69_911.0;

/// 正規化された角度（度、[0, 360)）
///
/// 生成・演算のたびに [0, 360) へ正規化されるため、
/// 360 を超える値や負の値を保持することはありません。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Angle {
    degrees: f64,
}

impl Angle {
    /// 度から角度を生成
    pub fn from_degrees(degrees: f64) -> Self {
        Self {
            degrees: math_utils::normalize_degrees(degrees),
        }
    }

    pub fn zero() -> Self {
        Self { degrees: 0.0 }
    }

    pub fn to_degrees(&self) -> f64 {
        self.degrees
    }

    pub fn to_radians(&self) -> f64 {
        self.degrees.to_radians()
    }

    /// 許容誤差付きの比較
    pub fn approx_eq(&self, other: &Angle, tolerance: f64) -> bool {
        let diff = (self.degrees - other.degrees).abs();
        diff <= tolerance || (360.0 - diff) <= tolerance
    }
}

impl From<f64> for Angle {
    fn from(degrees: f64) -> Self {
        Angle::from_degrees(degrees)
    }
}

impl From<Angle> for f64 {
    fn from(angle: Angle) -> Self {
        angle.degrees
    }
}

impl PartialOrd for Angle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.degrees.partial_cmp(&other.degrees)
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Angle::from_degrees(self.degrees + other.degrees)
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Angle::from_degrees(self.degrees - other.degrees)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.degrees)
    }
}

/// 回転方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// 時計回り（角度が減少）
    Clockwise,
    /// 反時計回り（角度が増加）
    AntiClockwise,
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 角度を [0, 360) の範囲に正規化
    pub fn normalize_degrees(angle_deg: f64) -> f64 {
        let normalized = angle_deg.rem_euclid(360.0);
        // rem_euclid は -0.0 近傍で 360.0 を返すことがある
        if normalized >= 360.0 { 0.0 } else { normalized }
    }

    /// 半径と速さから 1 分あたりの角速度（度）を計算
    pub fn angular_velocity_deg(linear_speed: f64, radius: f64) -> f64 {
        (linear_speed / radius).to_degrees()
    }

    /// 余弦定理による 2 点間距離
    pub fn chord_length(radius_a: f64, theta_a: f64, radius_b: f64, theta_b: f64) -> f64 {
        (radius_a.powi(2) + radius_b.powi(2)
            - 2.0 * radius_a * radius_b * (theta_a - theta_b).cos())
        .max(0.0)
        .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_angle_normalization() {
        assert_eq!(Angle::from_degrees(360.0).to_degrees(), 0.0);
        assert_eq!(Angle::from_degrees(-90.0).to_degrees(), 270.0);
        assert_eq!(Angle::from_degrees(725.0).to_degrees(), 5.0);
    }

    #[test]
    fn test_angle_arithmetic_wraps() {
        let sum = Angle::from_degrees(350.0) + Angle::from_degrees(20.0);
        assert!(sum.approx_eq(&Angle::from_degrees(10.0), 1e-9));

        let diff = Angle::from_degrees(5.0) - Angle::from_degrees(10.0);
        assert!(diff.approx_eq(&Angle::from_degrees(355.0), 1e-9));
    }

    #[test]
    fn test_angular_velocity() {
        let v = math_utils::angular_velocity_deg(2500.0, 100.0 + RADIUS_OF_JUPITER);
        assert!((v - 2.046).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_normalized_angle_in_range(deg in -1.0e6f64..1.0e6f64) {
            let angle = Angle::from_degrees(deg);
            prop_assert!(angle.to_degrees() >= 0.0);
            prop_assert!(angle.to_degrees() < 360.0);
        }
    }
}
