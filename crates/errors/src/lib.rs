use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("没有可用的配送员")]
    NoDriversAvailable,
    #[error("无效的坐标: 纬度 {latitude}, 经度 {longitude}")]
    InvalidLocation { latitude: f64, longitude: f64 },
    #[error("配送员未找到: {id}")]
    DriverNotFound { id: String },
    #[error("操作超时: {0}")]
    Timeout(String),
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("配送员目录错误: {0}")]
    Directory(String),
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn driver_not_found<S: Into<String>>(id: S) -> Self {
        Self::DriverNotFound { id: id.into() }
    }
    pub fn invalid_location(latitude: f64, longitude: f64) -> Self {
        Self::InvalidLocation {
            latitude,
            longitude,
        }
    }
    pub fn directory_error<S: Into<String>>(msg: S) -> Self {
        Self::Directory(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn is_no_drivers(&self) -> bool {
        matches!(self, DispatchError::NoDriversAvailable)
    }
    /// 目录本身的故障（I/O、数据库），与候选池耗尽区分开
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DispatchError::Database(_) | DispatchError::Directory(_)
        )
    }
    pub fn user_message(&self) -> &str {
        match self {
            DispatchError::NoDriversAvailable => "当前没有空闲的配送员，请稍后重试",
            DispatchError::InvalidLocation { .. } => "订单坐标无效",
            DispatchError::DriverNotFound { .. } => "请求的配送员不存在",
            DispatchError::Timeout(_) => "派单超时，请稍后重试",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        DispatchError::Internal(err.to_string())
    }
}
