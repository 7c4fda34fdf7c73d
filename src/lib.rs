pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{MemoryStore, SnapshotFile, Tables};
pub use config::TomlConfig;
pub use core::espacio_service::EspacioService;
pub use domain::model::{
    Departamento, Espacio, EspacioUpdate, Estatus, NuevoEspacio, ServicioMedicoEspacio,
    TipoEspacio,
};
pub use utils::error::{EspacioError, Result};
