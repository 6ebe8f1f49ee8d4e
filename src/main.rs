use std::path::Path;

use clap::{Arg, ArgAction, Command};
use tracing::{error, info};

use orbitsim::logging::{init_logging, parse_log_level, LogConfig, LogOutput};
use orbitsim::scenario::ScenarioConfig;
use orbitsim::simulation::SimulationEngine;

const SCENARIO_DIR: &str = "scenarios";

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("orbitsim")
        .version(env!("CARGO_PKG_VERSION"))
        .about("木星軌道ファイル転送シミュレーション")
        .long_about("木星を周回する衛星と地表デバイスの間のファイル転送を\n\
                     1 分刻みで再現するシミュレーターです。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定")
                .long_help("実行するシナリオファイル(.yaml)のパスを指定します。\n\
                           指定しない場合、利用可能なシナリオ一覧を表示します。")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .default_value("info")
                .help("ログレベル (trace, debug, info, warn, error)")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .default_value("console")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ")
        )
        .get_matches();

    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|s| parse_log_level(s))
            .unwrap_or(tracing::Level::INFO),
        output: matches
            .get_one::<LogOutput>("log-output")
            .copied()
            .unwrap_or(LogOutput::Console),
        log_dir: matches
            .get_one::<String>("log-dir")
            .cloned()
            .unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };

    if let Err(e) = init_logging(log_config) {
        eprintln!("ログ初期化エラー: {}", e);
        std::process::exit(1);
    }

    println!("木星軌道ファイル転送シミュレーション - orbitsim v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if verbose_level > 0 {
        println!("詳細出力レベル: {}", verbose_level);
    }

    // シナリオファイルの処理
    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                error!("シナリオ実行に失敗しました: {}", e);
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // デフォルト動作: 利用可能なシナリオ一覧を表示
        show_default_help();
    }
}

/// シナリオファイルを読み込んで実行
fn run_scenario(scenario_path: &str, info_only: bool, verbose_level: u8) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;
    info!("シナリオファイル読み込み完了: {}", scenario_path);

    // 情報表示のみの場合
    if info_only {
        scenario.print_summary();
        return Ok(());
    }

    scenario.print_summary();
    println!();

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    simulation.run();
    simulation.print_report()?;

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示
fn show_default_help() {
    println!("使用方法:");
    println!("  orbitsim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>    シナリオファイルを指定して実行");
    println!("  -i, --info               シナリオ情報のみ表示");
    println!("  -v, --verbose            詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LEVEL>  ログレベル (trace, debug, info, warn, error)");
    println!("      --log-output <OUT>   ログ出力先 (console, file, both)");
    println!("      --log-dir <DIR>      ログファイルの出力ディレクトリ");
    println!("  -h, --help               このヘルプを表示");
    println!();

    let scenarios = list_scenarios(Path::new(SCENARIO_DIR));
    if scenarios.is_empty() {
        println!("{}/ にシナリオファイルが見つかりません。", SCENARIO_DIR);
    } else {
        println!("利用可能なシナリオファイル:");
        for path in &scenarios {
            println!("  {}", path);
        }
        println!();
        println!("例:");
        println!("  orbitsim -s {}", scenarios[0]);
        println!("  orbitsim -s {} -v", scenarios[0]);
        println!("  orbitsim -s {} -i", scenarios[0]);
    }
}

fn list_scenarios(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml"))
        .map(|path| path.display().to_string())
        .collect();
    paths.sort();
    paths
}
