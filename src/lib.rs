//! # orbitsim
//!
//! 木星周回衛星と地表デバイスの間でファイルを転送するシミュレーターです。
//!
//! - [`models`]: エンティティ種別、軌道運動、可視判定
//! - [`world`]: エンティティ登録簿と 1 分ごとのティック処理
//! - [`transfer`]: 転送開始判定と転送状態の進行
//! - [`scenario`] / [`simulation`]: YAML シナリオの読み込みと実行
//! - [`logging`]: tracing によるログ出力設定

pub mod error;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
pub mod transfer;
pub mod world;
