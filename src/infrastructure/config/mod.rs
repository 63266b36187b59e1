mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, DispatchConfig, PushConfig, ServerConfig, Settings,
};
