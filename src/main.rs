use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use delivery_dispatch::{AppConfig, Application};
use dispatch_core::rank_by_distance;
use dispatch_domain::{DispatchError, DispatchOutcome, Driver, DriverDirectory, Location};
use dispatch_infrastructure::init_logging;
use rand::Rng;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliApp::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    init_logging(&config.observability)?;

    let app = Application::new(config).await?;
    let result = run(&app, cli.command).await;
    app.shutdown().await;
    if let Some(message) = result.as_ref().err().and_then(user_facing_message) {
        eprintln!("{message}");
    }
    result
}

/// 派单系统命令行工具
#[derive(Parser, Debug)]
#[command(name = "delivery-dispatch")]
#[command(version = "1.0.0")]
#[command(about = "外卖订单就近派单系统 - 命令行工具")]
#[command(long_about = "管理配送员目录，并按订单坐标预览或正式指派最近的可用配送员")]
struct CliApp {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径，缺省时依次查找 config/dispatch.toml 和 dispatch.toml
    #[arg(short, long)]
    config: Option<String>,

    /// 覆盖配置中的数据库URL
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 初始化数据库表结构
    Init,
    /// 配送员管理
    Driver(DriverCommands),
    /// 预览派单：返回最近的可用配送员，不做预占
    Propose(OrderArgs),
    /// 正式派单：选出最近的可用配送员并预占
    Assign(OrderArgs),
    /// 按距离列出候选配送员
    Rank {
        #[command(flatten)]
        order: OrderArgs,
        /// 最多显示的候选数量
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Args, Debug)]
struct OrderArgs {
    /// 订单纬度
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// 订单经度
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

impl OrderArgs {
    fn location(&self) -> Result<Location> {
        Location::new(self.lat, self.lon).context("订单坐标无效")
    }
}

#[derive(Args, Debug)]
struct DriverCommands {
    #[command(subcommand)]
    action: DriverActions,
}

#[derive(Subcommand, Debug)]
enum DriverActions {
    /// 注册配送员（已存在则覆盖）
    Register {
        /// 配送员ID
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// 注册为不可用状态
        #[arg(long)]
        unavailable: bool,
    },
    /// 上报配送员位置
    Move {
        #[arg(long)]
        id: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// 释放配送员，使其重新可接单
    Release {
        #[arg(long)]
        id: String,
    },
    /// 列出配送员
    List {
        /// 包含不可用的配送员
        #[arg(long)]
        all: bool,
    },
    /// 在指定坐标周围随机生成一批配送员
    Seed {
        /// 生成数量
        #[arg(long, default_value_t = 20)]
        count: usize,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// 随机偏移的最大度数
        #[arg(long, default_value_t = 0.05)]
        spread: f64,
        /// 配送员ID前缀
        #[arg(long, default_value = "driver")]
        prefix: String,
    },
}

async fn run(app: &Application, command: Commands) -> Result<()> {
    match command {
        Commands::Init => {
            app.health_check().await?;
            println!("数据库已就绪: {}", app.config().database.url);
        }
        Commands::Driver(driver) => run_driver(app, driver.action).await?,
        Commands::Propose(order) => {
            let outcome = app.service().propose(order.location()?).await?;
            print_outcome(&outcome)?;
        }
        Commands::Assign(order) => {
            let outcome = app.service().assign(order.location()?).await?;
            print_outcome(&outcome)?;
        }
        Commands::Rank { order, limit } => {
            let location = order.location()?;
            let candidates = app.directory().list_available().await?;
            let ranked = rank_by_distance(&location, &candidates);
            if ranked.is_empty() {
                println!("没有可用的配送员");
            }
            for (index, selection) in ranked.iter().take(limit).enumerate() {
                println!(
                    "{:>3}. {:<20} {:>10.3} km",
                    index + 1,
                    selection.driver_id,
                    selection.distance_km
                );
            }
        }
    }
    Ok(())
}

async fn run_driver(app: &Application, action: DriverActions) -> Result<()> {
    let directory = app.directory();
    match action {
        DriverActions::Register {
            id,
            lat,
            lon,
            unavailable,
        } => {
            let mut driver = Driver::new(id, Location::new(lat, lon)?);
            if unavailable {
                driver = driver.unavailable();
            }
            directory.upsert(&driver).await?;
            println!("已注册配送员: {} {}", driver.id, driver.current_location);
        }
        DriverActions::Move { id, lat, lon } => {
            directory.update_location(&id, Location::new(lat, lon)?).await?;
            println!("已更新配送员位置: {id}");
        }
        DriverActions::Release { id } => {
            directory.release(&id).await?;
            println!("已释放配送员: {id}");
        }
        DriverActions::List { all } => {
            let drivers = if all {
                directory.list_all().await?
            } else {
                directory.list_available().await?
            };
            for driver in &drivers {
                println!(
                    "{:<20} {:<26} {:<6} {}",
                    driver.id,
                    driver.current_location.to_string(),
                    if driver.available { "空闲" } else { "忙碌" },
                    driver.updated_at.to_rfc3339()
                );
            }
            println!("共 {} 名配送员", drivers.len());
        }
        DriverActions::Seed {
            count,
            lat,
            lon,
            spread,
            prefix,
        } => {
            let center = Location::new(lat, lon)?;
            let spread = checked_spread(spread)?;
            let mut rng = rand::rng();
            for i in 0..count {
                let location = scatter(center, spread, &mut rng)?;
                directory
                    .upsert(&Driver::new(format!("{prefix}-{i:03}"), location))
                    .await?;
            }
            info!("已生成 {} 名配送员，中心点 {}", count, center);
            println!("已生成 {count} 名配送员");
        }
    }
    Ok(())
}

/// 随机偏移量必须是有限数，取绝对值
fn checked_spread(spread: f64) -> Result<f64, DispatchError> {
    if !spread.is_finite() {
        return Err(DispatchError::config_error(format!(
            "随机偏移必须是有限数: {spread}"
        )));
    }
    Ok(spread.abs())
}

fn scatter(center: Location, spread: f64, rng: &mut impl Rng) -> Result<Location, DispatchError> {
    Location::new(
        (center.latitude + rng.random_range(-spread..=spread)).clamp(-90.0, 90.0),
        (center.longitude + rng.random_range(-spread..=spread)).clamp(-180.0, 180.0),
    )
}

/// 派单错误附带面向用户的提示，其余错误只输出错误链
fn user_facing_message(err: &anyhow::Error) -> Option<&str> {
    err.downcast_ref::<DispatchError>()
        .map(DispatchError::user_message)
}

fn print_outcome(outcome: &DispatchOutcome) -> Result<()> {
    let output = serde_json::to_string_pretty(outcome).context("序列化派单结果失败")?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_spread_rejects_non_finite() {
        for spread in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = checked_spread(spread).unwrap_err();
            assert!(matches!(err, DispatchError::Configuration(_)));
        }
        assert_eq!(checked_spread(-0.05).unwrap(), 0.05);
    }

    #[test]
    fn test_scatter_stays_within_spread() {
        let center = Location::new_unchecked(6.9271, 79.8612);
        let mut rng = rand::rng();
        for _ in 0..100 {
            let location = scatter(center, 0.05, &mut rng).unwrap();
            assert!((location.latitude - center.latitude).abs() <= 0.05 + 1e-12);
            assert!((location.longitude - center.longitude).abs() <= 0.05 + 1e-12);
        }
        assert_eq!(scatter(center, 0.0, &mut rng).unwrap(), center);
    }

    #[test]
    fn test_scatter_clamps_near_pole() {
        let center = Location::new_unchecked(89.99, 179.99);
        let mut rng = rand::rng();
        for _ in 0..50 {
            assert!(scatter(center, 1.0, &mut rng).unwrap().is_valid());
        }
    }

    #[test]
    fn test_user_facing_message_for_dispatch_errors() {
        let err = anyhow::Error::from(DispatchError::NoDriversAvailable);
        assert_eq!(
            user_facing_message(&err),
            Some("当前没有空闲的配送员，请稍后重试")
        );

        let err = anyhow::Error::from(DispatchError::invalid_location(95.0, 0.0))
            .context("订单坐标无效");
        assert_eq!(user_facing_message(&err), Some("订单坐标无效"));

        let err = anyhow::anyhow!("加载配置失败");
        assert_eq!(user_facing_message(&err), None);
    }
}
