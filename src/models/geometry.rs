//! 可視性と距離の判定
//!
//! 全てのエンティティは木星中心を原点とする平面上の円周に配置されます。
//! デバイスは表面（半径 RADIUS_OF_JUPITER）、衛星は各自の軌道半径上です。
//!
//! - デバイス↔衛星: 衛星がデバイスの地平線以上にあれば可視
//! - 衛星↔衛星: 2 点を結ぶ線分が木星本体を横切らなければ可視

use crate::models::{
    common::{math_utils, Angle, RADIUS_OF_JUPITER},
    traits::IEntity,
};

/// 極座標を直交座標へ変換
fn to_cartesian(height: f64, angle: Angle) -> (f64, f64) {
    let theta = angle.to_radians();
    (height * theta.cos(), height * theta.sin())
}

/// 衛星とデバイス間の可視判定
///
/// デバイスは表面上にあるため、衛星への方向ベクトルと
/// デバイス位置の法線との内積が非負であれば見通しがあります。
pub fn is_visible_from_surface(satellite_height: f64, satellite_angle: Angle, device_angle: Angle) -> bool {
    let delta = satellite_angle.to_radians() - device_angle.to_radians();
    satellite_height * delta.cos() >= RADIUS_OF_JUPITER
}

/// 衛星同士の可視判定
pub fn is_visible(height_a: f64, angle_a: Angle, height_b: f64, angle_b: Angle) -> bool {
    let (ax, ay) = to_cartesian(height_a, angle_a);
    let (bx, by) = to_cartesian(height_b, angle_b);
    let (dx, dy) = (bx - ax, by - ay);
    let length_sq = dx * dx + dy * dy;

    // 線分上で原点に最も近い点
    let t = if length_sq > 0.0 {
        (-(ax * dx + ay * dy) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);

    (cx * cx + cy * cy).sqrt() >= RADIUS_OF_JUPITER
}

/// 2 点間のユークリッド距離
pub fn distance(height_a: f64, angle_a: Angle, height_b: f64, angle_b: Angle) -> f64 {
    math_utils::chord_length(height_a, angle_a.to_radians(), height_b, angle_b.to_radians())
}

/// 衛星と表面上のデバイスとの距離
pub fn distance_to_surface(satellite_height: f64, satellite_angle: Angle, device_angle: Angle) -> f64 {
    distance(satellite_height, satellite_angle, RADIUS_OF_JUPITER, device_angle)
}

/// `observer` から `other` が通信範囲内にあるか
///
/// 通信距離の上限は `other` の種別で決まります。
pub fn in_range(observer: &dyn IEntity, other: &dyn IEntity) -> bool {
    let limit = other.kind().range_limit();

    if other.is_device() {
        is_visible_from_surface(observer.height(), observer.position(), other.position())
            && distance_to_surface(observer.height(), observer.position(), other.position()) < limit
    } else if observer.is_device() {
        is_visible_from_surface(other.height(), other.position(), observer.position())
            && distance_to_surface(other.height(), other.position(), observer.position()) < limit
    } else {
        is_visible(observer.height(), observer.position(), other.height(), other.position())
            && distance(observer.height(), observer.position(), other.height(), other.position())
                < limit
    }
}

/// `candidate` が `target` と通信できるか
///
/// 範囲内であること、`candidate` の種別が `target` の種別に対応していること、
/// 自分自身ではないことが条件です。
pub fn can_communicate(candidate: &dyn IEntity, target: &dyn IEntity) -> bool {
    candidate.get_id() != target.get_id()
        && candidate.kind().supports(target.kind())
        && in_range(candidate, target)
}
