//! Configuration record and its lifecycle
//!
//! The master record is a plain serde structure. Board differences live
//! in a constant descriptor table rather than behind cargo features, so
//! every board builds and tests on the host.

pub mod board;
pub mod defaults;
pub mod eeprom;
pub mod features;
pub mod master;
pub mod mixer;
pub mod nav;
pub mod pg;
pub mod profile;
pub mod serial;
pub mod store;
pub mod types;
pub mod validate;

pub use board::{BoardDescriptor, BoardId};
pub use defaults::{factory_config, reset_defaults};
pub use eeprom::{EepromError, EEPROM_CONF_VERSION};
pub use features::{ActiveFeatures, BeeperMode, Features, PersistentFlags};
pub use master::MasterConfig;
pub use store::{ConfigError, ConfigHandle, ConfigStore};
pub use validate::validate_and_fix_config;
