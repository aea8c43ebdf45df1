//! StoryboardStore - composition root
//!
//! Connects the pool from [`StoreConfig`] and hands every entity service the
//! same `Arc<dyn Database>`.

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::config::StoreConfig;
use crate::db::{Database, MySqlDatabase};
use crate::entities::{
    CharacterVariants, Characters, PanelCharacters, Panels, Projects, Settings, Users,
};
use crate::error::Result;
use crate::migration::MigrationRunner;

/// Entity services over one shared store
pub struct StoryboardStore {
    db: Arc<dyn Database>,
    config: StoreConfig,
    users: Users,
    projects: Projects,
    characters: Characters,
    character_variants: CharacterVariants,
    settings: Settings,
    panels: Panels,
    panel_characters: PanelCharacters,
}

impl StoryboardStore {
    /// Connect to the database named by the configuration
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let db = MySqlDatabase::connect(&config).await?;
        Ok(Self::from_database(Arc::new(db), config))
    }

    /// Use an existing pool
    pub fn from_pool(pool: MySqlPool, config: StoreConfig) -> Self {
        Self::from_database(Arc::new(MySqlDatabase::new(pool)), config)
    }

    /// Use any [`Database`] implementation
    pub fn from_database(db: Arc<dyn Database>, config: StoreConfig) -> Self {
        Self {
            users: Users::new(db.clone()),
            projects: Projects::new(db.clone()),
            characters: Characters::new(db.clone()),
            character_variants: CharacterVariants::new(db.clone()),
            settings: Settings::new(db.clone()),
            panels: Panels::new(db.clone()),
            panel_characters: PanelCharacters::new(db.clone()),
            db,
            config,
        }
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        &self.db
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Runner over the configured migrations directory and bookkeeping table
    pub fn migrations(&self) -> MigrationRunner {
        MigrationRunner::from_config(self.db.clone(), &self.config)
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn projects(&self) -> &Projects {
        &self.projects
    }

    pub fn characters(&self) -> &Characters {
        &self.characters
    }

    pub fn character_variants(&self) -> &CharacterVariants {
        &self.character_variants
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn panels(&self) -> &Panels {
        &self.panels
    }

    pub fn panel_characters(&self) -> &PanelCharacters {
        &self.panel_characters
    }
}
