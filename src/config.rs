use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::Session;

#[derive(Parser, Debug)]
#[command(name = "agora", about = "Command line client for the agora forum")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Root of the REST API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub access_token: Option<String>,

    #[arg(long)]
    pub refresh_token: Option<String>,

    /// Id of the signed-in user
    #[arg(long)]
    pub user_id: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List posts
    Posts {
        #[arg(long, value_enum, default_value_t = SourceArg::All)]
        source: SourceArg,
        /// Owner of the user or favorites list (defaults to the signed-in user)
        #[arg(long)]
        user: Option<u64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "category")]
        categories: Vec<u64>,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = SortArg::Rating)]
        sort: SortArg,
        #[arg(long, value_enum, default_value_t = OrderArg::Desc)]
        order: OrderArg,
        #[arg(long, value_enum, default_value_t = StatusArg::Active)]
        status: StatusArg,
        #[arg(long, default_value_t = 1)]
        page: i64,
    },
    /// Show one post
    Post { id: u64 },
    LikePost { id: u64 },
    DislikePost { id: u64 },
    UnreactPost { id: u64 },
    /// Show the comment threads of a post
    Comments { post_id: u64 },
    LikeComment {
        #[arg(long)]
        post: u64,
        id: u64,
    },
    DislikeComment {
        #[arg(long)]
        post: u64,
        id: u64,
    },
    /// List categories
    Categories {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value = "")]
        title: String,
    },
    /// List users
    Users {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, value_enum, default_value_t = UserSortArg::Login)]
        sort: UserSortArg,
        #[arg(long, value_enum, default_value_t = OrderArg::Asc)]
        order: OrderArg,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    All,
    User,
    Favorites,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Rating,
    CreatedAt,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    Asc,
    Desc,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    Active,
    Inactive,
    Both,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortArg {
    Login,
    Rating,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub lists: ListsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SessionConfig {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<u64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ListsConfig {
    pub debounce_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref base_url) = cli.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(ref token) = cli.access_token {
            config.session.access_token = Some(token.clone());
        }
        if let Some(ref token) = cli.refresh_token {
            config.session.refresh_token = Some(token.clone());
        }
        if let Some(user_id) = cli.user_id {
            config.session.user_id = Some(user_id);
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".agora")
        })
    }

    pub fn session(&self) -> Session {
        Session {
            access_token: self.session.access_token.clone(),
            refresh_token: self.session.refresh_token.clone(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.lists.debounce_ms)
    }
}
